// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for the Bastion CLI.
//!
//! Uses `tracing` with `tracing-subscriber`, writing to stderr so stdout
//! stays clean for command output. The `RUST_LOG` environment variable
//! overrides the defaults.
//!
//! # Examples
//!
//! ```bash
//! # Default: warnings from bastion, errors from dependencies
//! bastion fetch 42
//!
//! # Request-level tracing (method and redacted URL only)
//! RUST_LOG=bastion_core=debug bastion fetch 42
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "bastion=warn,reqwest=error";

/// Default filter with `--verbose`.
const VERBOSE_FILTER: &str = "bastion=debug,reqwest=warn";

/// Initialize the logging subsystem.
///
/// The `bastion` directive covers both `bastion_cli` and `bastion_core`
/// targets, since directives match by prefix.
pub fn init_logging(verbose: bool) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let default_filter = if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .expect("valid default filter directives");

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
