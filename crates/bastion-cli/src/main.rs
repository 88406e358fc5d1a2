// SPDX-License-Identifier: Apache-2.0

//! Bastion - guarded database connections, file access and API fetches.
//!
//! A CLI over `bastion-core`: connects only to allow-listed hosts, keeps
//! file access inside one root directory and bounds every remote request.

mod cli;
mod commands;
mod errors;
mod logging;
mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use bastion_core::config;
use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, OutputContext};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let formatted = errors::format_error(&e);
            eprintln!("Error: {formatted}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output_ctx = OutputContext::from_cli(cli.output, cli.verbose);

    let (config, source) = match &cli.config {
        Some(path) => (
            config::load_config_from(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            path.clone(),
        ),
        None => (
            config::load_config().context("Failed to load configuration")?,
            config::config_file_path(),
        ),
    };
    debug!("Configuration loaded successfully");

    commands::run(cli.command, output_ctx, &config, &source).await
}
