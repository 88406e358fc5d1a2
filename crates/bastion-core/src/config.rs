// SPDX-License-Identifier: Apache-2.0

//! Configuration management for Bastion.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support. None of the
//! components read configuration on their own: callers load an [`AppConfig`]
//! and hand the relevant section to each constructor.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables (prefix: `BASTION_`)
//! 2. Config file: `~/.config/bastion/config.toml`
//! 3. Built-in defaults
//!
//! # Examples
//!
//! ```bash
//! # Shorten the API timeout via environment variable
//! BASTION_API__TIMEOUT_SECONDS=5 bastion fetch 42
//!
//! # Allow two database hosts
//! BASTION_CONNECTOR__ALLOWED_HOSTS=db.internal,*.replicas.internal bastion connect postgres://db.internal/app
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::BastionError;

/// Default API request timeout in seconds.
///
/// Applied to every request issued by [`crate::api::ApiClient`] when the
/// configuration does not override it. Requests are never unbounded.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connector handshake budget in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Application configuration.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Connector settings.
    pub connector: ConnectorConfig,
    /// File store settings.
    pub store: StoreConfig,
    /// API client settings.
    pub api: ApiConfig,
}

/// Connector settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Hosts a descriptor may point at. Exact match, case-insensitive;
    /// an entry of the form `*.example.com` matches any subdomain.
    pub allowed_hosts: Vec<String>,
    /// Descriptor schemes accepted by the connector.
    pub allowed_schemes: Vec<String>,
    /// Handshake budget in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            allowed_schemes: ["postgres", "postgresql", "mysql"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

impl ConnectorConfig {
    /// Returns true if `host` matches an entry of the allow-list.
    #[must_use]
    pub fn is_host_allowed(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }
        self.allowed_hosts.iter().any(|entry| {
            let entry = entry.trim().trim_end_matches('.').to_ascii_lowercase();
            match entry.strip_prefix("*.") {
                Some(suffix) if !suffix.is_empty() => host
                    .strip_suffix(suffix)
                    .is_some_and(|label| label.len() > 1 && label.ends_with('.')),
                _ => entry == host,
            }
        })
    }

    /// Returns true if `scheme` is in the scheme allow-list.
    #[must_use]
    pub fn is_scheme_allowed(&self, scheme: &str) -> bool {
        self.allowed_schemes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme))
    }

    /// Handshake budget as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// File store settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory every file operation is confined to. No default.
    pub root: Option<PathBuf>,
}

/// API client settings.
///
/// There is deliberately no setting that disables certificate validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the remote API, e.g. `https://api.example.com`.
    pub base_url: Option<String>,
    /// Request timeout in seconds, applied to every request.
    pub timeout_seconds: u64,
    /// Field in the primary payload holding the enrichment reference.
    pub enrichment_field: String,
    /// Field the enrichment payload is merged under.
    pub details_field: String,
    /// Refuse plain `http://` base URLs and enrichment references.
    pub require_https: bool,
    /// Only follow enrichment references on the same origin as the base URL.
    pub same_origin_enrichment: bool,
    /// Maximum in-flight requests for batch fetches.
    pub max_concurrency: usize,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            enrichment_field: "detailsUrl".to_string(),
            details_field: "details".to_string(),
            require_https: true,
            same_origin_enrichment: true,
            max_concurrency: 4,
            user_agent: concat!("bastion/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Returns the Bastion configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/bastion`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join("bastion");
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".config")
        .join("bastion")
}

/// Returns the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load application configuration from the default file location.
///
/// Loads from config file (if exists) and environment variables.
/// Environment variables use the prefix `BASTION_` and double underscore
/// for nested keys (e.g., `BASTION_API__BASE_URL`).
///
/// # Errors
///
/// Returns `BastionError::Config` if the config file exists but is invalid.
pub fn load_config() -> Result<AppConfig, BastionError> {
    build_config(&config_file_path(), false)
}

/// Load application configuration from an explicit file.
///
/// Unlike [`load_config`], the file must exist.
///
/// # Errors
///
/// Returns `BastionError::Config` if the file is missing or invalid.
pub fn load_config_from(path: &Path) -> Result<AppConfig, BastionError> {
    build_config(path, true)
}

fn build_config(path: &Path, required: bool) -> Result<AppConfig, BastionError> {
    let config = Config::builder()
        .add_source(File::from(path).required(required))
        .add_source(
            Environment::with_prefix("BASTION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("connector.allowed_hosts")
                .with_list_parse_key("connector.allowed_schemes"),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}
