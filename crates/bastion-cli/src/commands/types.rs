// SPDX-License-Identifier: Apache-2.0

//! Result types returned by command handlers.
//!
//! Command handlers return data instead of printing directly; the output
//! module decides how to present it.

use std::path::PathBuf;

use bastion_core::{AppConfig, ConnectionStatus, FileEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Result from the connect command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConnectResult {
    /// Descriptor with the password redacted.
    pub descriptor: String,
    /// Handle identifier.
    pub id: String,
    /// Host connected to.
    pub host: String,
    /// When the handshake completed.
    pub opened_at: DateTime<Utc>,
    /// Status after the handle was closed.
    pub status: ConnectionStatus,
}

/// Result from `file read`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileReadResult {
    /// Path as requested.
    pub path: String,
    /// Size in bytes.
    pub size: usize,
    /// Contents, lossily decoded as UTF-8.
    pub content: String,
    /// Raw contents for text output.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Result from `file write`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileWriteResult {
    /// Path as requested.
    pub path: String,
    /// Number of bytes written.
    pub bytes_written: u64,
    /// Whether an existing file was replaced.
    pub replaced: bool,
}

/// Result from `file list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileListResult {
    /// Directory listed, relative to the root.
    pub dir: String,
    /// Regular files in that directory.
    pub entries: Vec<FileEntry>,
}

/// Result from `file remove`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileRemoveResult {
    /// Path as requested.
    pub path: String,
}

/// Result from `fetch`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FetchOutput {
    /// Requested identifier.
    pub id: String,
    /// Whether an enrichment payload was merged in.
    pub enriched: bool,
    /// The user, with details merged in when enriched.
    pub user: Value,
}

/// One entry of a batch fetch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchItem {
    /// Requested identifier.
    pub id: String,
    /// The user, if the fetch succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    /// Error message, if the fetch failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result from `fetch-batch`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchResult {
    /// Per-id results, in request order.
    pub results: Vec<BatchItem>,
}

impl BatchResult {
    /// Number of failed fetches.
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }
}

/// Result from `config show`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConfigResult {
    /// File the configuration was loaded from.
    pub source: PathBuf,
    /// Effective configuration.
    pub config: AppConfig,
}
