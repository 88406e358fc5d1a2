// SPDX-License-Identifier: Apache-2.0

//! Parameterised statements.
//!
//! SQL text and values travel separately. Placeholders use the positional
//! `?N` form (1-based); every index from 1 to the parameter count must appear
//! at least once and no other index may appear. Values are never spliced
//! into the SQL text.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::ConnectionError;

/// A single bound value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit integer.
    Integer(i64),
    /// Double-precision float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// SQL text plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    sql: String,
    params: Vec<SqlValue>,
}

impl Statement {
    /// Builds a statement, checking placeholders against `params`.
    pub fn new(sql: &str, params: Vec<SqlValue>) -> Result<Self, ConnectionError> {
        let indices = placeholder_indices(sql)?;

        let expected: BTreeSet<usize> = (1..=params.len()).collect();
        if indices != expected {
            return Err(invalid(&format!(
                "statement uses {} distinct placeholder(s) but {} parameter(s) were bound",
                indices.len(),
                params.len()
            )));
        }

        Ok(Self {
            sql: sql.to_string(),
            params,
        })
    }

    /// The SQL text, with placeholders intact.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound parameters, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

fn invalid(reason: &str) -> ConnectionError {
    ConnectionError::InvalidStatement {
        reason: reason.to_string(),
    }
}

/// Collects the `?N` indices used outside quoted literals, identifiers and
/// comments.
fn placeholder_indices(sql: &str) -> Result<BTreeSet<usize>, ConnectionError> {
    let mut indices = BTreeSet::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            // Doubled quotes inside a literal toggle twice, which is a no-op.
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '-' if chars.peek() == Some(&'-') => {
                // Line comment runs to the end of the line.
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                let mut closed = false;
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        closed = true;
                        break;
                    }
                    prev = skipped;
                }
                if !closed {
                    return Err(invalid("unterminated block comment"));
                }
            }
            '?' => {
                let mut digits = String::new();
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(d);
                    chars.next();
                }
                if digits.is_empty() {
                    return Err(invalid("bare '?' placeholder, use numbered '?N'"));
                }
                let index: usize = digits
                    .parse()
                    .map_err(|_| invalid("placeholder index out of range"))?;
                if index == 0 {
                    return Err(invalid("placeholder indices start at ?1"));
                }
                indices.insert(index);
            }
            _ => {}
        }
    }

    if quote.is_some() {
        return Err(invalid("unterminated quoted literal"));
    }

    Ok(indices)
}
