// SPDX-License-Identifier: Apache-2.0

//! Error types for Bastion.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations. Each
//! component owns its own enum so callers can match on exactly the failures
//! that component can produce; [`BastionError`] aggregates them for code that
//! drives several components at once. Application code should use
//! `anyhow::Result` for top-level error handling.
//!
//! No variant carries credentials, file contents or request bodies. URLs are
//! stored with userinfo and query string already stripped.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by [`crate::connector::Connector`] and its handles.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// The descriptor is empty, unparseable or uses a scheme outside the allow-list.
    #[error("Invalid connection descriptor: {reason}")]
    InvalidDescriptor {
        /// Why the descriptor was rejected.
        reason: String,
    },

    /// The descriptor's host is not in the configured allow-list.
    #[error("Connection refused: host '{host}' is not allowed")]
    ConnectionRefused {
        /// Host that was refused.
        host: String,
    },

    /// The deadline elapsed before the handshake completed.
    #[error("Connection attempt timed out after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds spent before giving up.
        elapsed_ms: u64,
    },

    /// The handshake ran to completion but reported a failure.
    #[error("Handshake failed: {reason}")]
    HandshakeFailed {
        /// Reason reported by the handshake.
        reason: String,
    },

    /// The handle was used after being closed.
    #[error("Connection is closed")]
    Closed,

    /// A statement's placeholders and parameters do not line up.
    #[error("Invalid statement: {reason}")]
    InvalidStatement {
        /// Why the statement was rejected.
        reason: String,
    },
}

/// Errors produced by [`crate::store::FileStore`].
#[derive(Error, Debug)]
pub enum FileError {
    /// The requested path resolves outside the store root.
    #[error("Path escapes the store root: {requested}")]
    PathEscapesRoot {
        /// Relative path as supplied by the caller.
        requested: String,
    },

    /// The requested file (or its parent directory) does not exist.
    #[error("Not found: {requested}")]
    NotFound {
        /// Relative path as supplied by the caller.
        requested: String,
    },

    /// The requested path exists but is not a regular file.
    #[error("Not a regular file: {requested}")]
    NotAFile {
        /// Relative path as supplied by the caller.
        requested: String,
    },

    /// The store root could not be used.
    #[error("Invalid store root {}: {reason}", root.display())]
    InvalidRoot {
        /// Root directory as configured.
        root: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Any other I/O failure.
    #[error("I/O error on {requested}: {source}")]
    Io {
        /// Relative path as supplied by the caller.
        requested: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// Maps an I/O error to the matching variant for `requested`.
    pub(crate) fn from_io(requested: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FileError::NotFound {
                requested: requested.to_string(),
            }
        } else {
            FileError::Io {
                requested: requested.to_string(),
                source,
            }
        }
    }
}

/// Why a single HTTP exchange failed.
#[derive(Error, Debug)]
pub enum RequestFailure {
    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Redacted request URL.
        url: String,
        /// Status code returned.
        status: u16,
    },

    /// The request exceeded the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout {
        /// Redacted request URL.
        url: String,
    },

    /// Connection, TLS or protocol failure.
    #[error("Transport error for {url}: {source}")]
    Transport {
        /// Redacted request URL.
        url: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The body was not valid JSON.
    #[error("Failed to parse response from {url}: {source}")]
    Parse {
        /// Redacted request URL.
        url: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The body was JSON but not the expected shape.
    #[error("Unexpected response from {url}: {reason}")]
    UnexpectedShape {
        /// Redacted request URL.
        url: String,
        /// What was expected.
        reason: String,
    },

    /// The request was refused before being sent.
    #[error("Refused to request {url}: {reason}")]
    Rejected {
        /// Redacted request URL.
        url: String,
        /// Why the request was refused.
        reason: String,
    },
}

impl RequestFailure {
    /// Returns true if this failure was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, RequestFailure::Timeout { .. })
    }

    /// Returns the HTTP status code, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors produced by [`crate::api::ApiClient`].
#[derive(Error, Debug)]
pub enum ApiError {
    /// The primary resource request failed.
    #[error("Primary request failed: {0}")]
    Primary(#[source] RequestFailure),

    /// The primary request succeeded but the single follow-up request failed.
    #[error("Enrichment request failed: {0}")]
    Enrichment(#[source] RequestFailure),

    /// The client configuration or call arguments are unusable.
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// Why the request could not be built.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    /// Returns true if the underlying failure was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            ApiError::Primary(f) | ApiError::Enrichment(f) => f.is_timeout(),
            _ => false,
        }
    }
}

/// Rejected user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name.
        field: &'static str,
    },

    /// The email address is malformed.
    #[error("Invalid email address")]
    InvalidEmail,

    /// A field exceeds its maximum length.
    #[error("Field {field} exceeds {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },
}

/// Errors that can occur during Bastion operations.
#[derive(Error, Debug)]
pub enum BastionError {
    /// Connector failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// File store failure.
    #[error(transparent)]
    File(#[from] FileError),

    /// API client failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Input validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration file or environment error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },
}

impl From<config::ConfigError> for BastionError {
    fn from(err: config::ConfigError) -> Self {
        BastionError::Config {
            message: err.to_string(),
        }
    }
}
