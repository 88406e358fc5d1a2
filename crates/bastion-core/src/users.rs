// SPDX-License-Identifier: Apache-2.0

//! User record validation.
//!
//! Records are validated and normalised once, at construction, so every
//! [`NewUser`] that reaches the connector or the API client is known-good.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ValidationError;

/// Maximum length of a user name, in characters.
pub const MAX_NAME_LEN: usize = 128;

/// Maximum length of an email address (RFC 5321 path limit).
pub const MAX_EMAIL_LEN: usize = 254;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// Returns true if `email` is a plausible address.
///
/// Anchored on both ends, requires a dotted domain and rejects whitespace,
/// so inputs like `a@b`, `@x.com` or `a b@c.com` fail.
#[must_use]
pub fn validate_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN
        && !email.starts_with('.')
        && !email.contains("..")
        && EMAIL_RE.is_match(email)
}

/// A validated user record ready to be stored or sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    name: String,
    email: String,
}

impl NewUser {
    /// Validates and normalises a user record.
    ///
    /// The name is trimmed; the email is trimmed and lowercased.
    pub fn new(name: &str, email: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField { field: "name" });
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN,
            });
        }

        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(ValidationError::MissingField { field: "email" });
        }
        if email.chars().count() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }
        if !validate_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Self {
            name: name.to_string(),
            email,
        })
    }

    /// The trimmed display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalised email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("first.last+tag@sub.example.co.uk"));
    }

    #[test]
    fn rejects_what_a_loose_pattern_would_accept() {
        for bad in [
            "a@b",
            "@example.com",
            "user@",
            "user name@example.com",
            "user@exa mple.com",
            "user@@example.com",
            "user@example..com",
            ".user@example.com",
            "user..x@example.com",
            "user@-example.com",
            "<script>@example.com",
        ] {
            assert!(!validate_email(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn new_user_normalises_fields() {
        let user = NewUser::new("  Ada Lovelace ", "  Ada@Example.COM ").expect("valid");
        assert_eq!(user.name(), "Ada Lovelace");
        assert_eq!(user.email(), "ada@example.com");
    }

    #[test]
    fn new_user_requires_fields() {
        assert_eq!(
            NewUser::new("   ", "a@example.com"),
            Err(ValidationError::MissingField { field: "name" })
        );
        assert_eq!(
            NewUser::new("Ada", ""),
            Err(ValidationError::MissingField { field: "email" })
        );
    }

    #[test]
    fn new_user_rejects_invalid_email() {
        assert_eq!(
            NewUser::new("Ada", "not-an-email"),
            Err(ValidationError::InvalidEmail)
        );
    }

    #[test]
    fn new_user_rejects_long_name() {
        let name = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            NewUser::new(&name, "a@example.com"),
            Err(ValidationError::TooLong {
                field: "name",
                max: MAX_NAME_LEN
            })
        );
    }
}
