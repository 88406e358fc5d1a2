// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # Bastion Core
//!
//! Core library for Bastion - guarded access to databases, files and a
//! remote user API.
//!
//! This crate provides three independent components:
//! - An allow-listed, deadline-bounded database connector with
//!   parameterised statements
//! - A file store confined to one root directory, with atomic writes
//! - An HTTP client with a mandatory timeout and a fetch that follows at
//!   most one enrichment reference
//!
//! None of them reads configuration or environment on its own; callers load
//! an [`AppConfig`] and pass the relevant section in.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bastion_core::{ApiClient, FileStore, load_config};
//! use anyhow::Result;
//!
//! # async fn example() -> Result<()> {
//! let config = load_config()?;
//!
//! let store = FileStore::open("/data").await?;
//! store.write("reports/out.txt", "hello").await?;
//! assert_eq!(store.read_to_string("reports/out.txt").await?, "hello");
//!
//! let client = ApiClient::new(&config.api)?;
//! let user = client.fetch_enriched("42").await?;
//! println!("{}", user.merged());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Remote API client and enrichment
//! - [`config`] - Configuration loading and paths
//! - [`connector`] - Database connector, descriptors and statements
//! - [`error`] - Error types
//! - [`store`] - Root-scoped file store
//! - [`users`] - User record validation

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{
    ApiError, BastionError, ConnectionError, FileError, RequestFailure, ValidationError,
};

/// Convenience Result type for Bastion operations.
///
/// This is equivalent to `std::result::Result<T, BastionError>`.
pub type Result<T> = std::result::Result<T, BastionError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    ApiConfig, AppConfig, ConnectorConfig, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_TIMEOUT_SECS,
    StoreConfig, config_dir, config_file_path, load_config, load_config_from,
};

// ============================================================================
// Connector
// ============================================================================

pub use connector::{
    AcceptHandshake, ConnectionDescriptor, ConnectionHandle, ConnectionStatus, Connector,
    Handshake, SqlValue, Statement,
};

// ============================================================================
// File Store
// ============================================================================

pub use store::{FileEntry, FileStore, WriteOutcome};

// ============================================================================
// API Client
// ============================================================================

pub use api::{ApiClient, FetchResult, redact_url};

// ============================================================================
// Users
// ============================================================================

pub use users::{NewUser, validate_email};

// ============================================================================
// Modules
// ============================================================================

pub mod api;
pub mod config;
pub mod connector;
pub mod error;
pub mod store;
pub mod users;
