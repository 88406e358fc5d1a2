// SPDX-License-Identifier: Apache-2.0

//! Remote API integration.
//!
//! Provides [`ApiClient`], a JSON-over-HTTPS client with a mandatory request
//! timeout and a fetch-and-enrich call that follows at most one reference.

mod client;

pub use client::ApiClient;

use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value};

/// A primary resource plus the optional payload its enrichment reference
/// pointed at.
///
/// Only produced when every request involved succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    resource: Map<String, Value>,
    details: Option<Value>,
    #[serde(skip)]
    details_field: String,
}

impl FetchResult {
    pub(crate) fn new(
        resource: Map<String, Value>,
        details: Option<Value>,
        details_field: &str,
    ) -> Self {
        Self {
            resource,
            details,
            details_field: details_field.to_string(),
        }
    }

    /// The primary payload as returned by the server.
    #[must_use]
    pub fn resource(&self) -> &Map<String, Value> {
        &self.resource
    }

    /// The enrichment payload, if the primary payload referenced one.
    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Returns the combined object.
    ///
    /// The enrichment payload is stored under the configured details field,
    /// replacing any value the primary payload had there.
    #[must_use]
    pub fn merged(&self) -> Value {
        self.clone().into_merged()
    }

    /// Consuming form of [`FetchResult::merged`].
    #[must_use]
    pub fn into_merged(self) -> Value {
        let mut combined = self.resource;
        if let Some(details) = self.details {
            combined.insert(self.details_field, details);
        }
        Value::Object(combined)
    }
}

/// Renders `url` for logs and error messages.
///
/// Credentials, query string and fragment are dropped.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut shown = url.clone();
    // Both setters only fail for cannot-be-a-base URLs, which carry no userinfo.
    let _ = shown.set_username("");
    let _ = shown.set_password(None);
    shown.set_query(None);
    shown.set_fragment(None);
    shown.to_string()
}
