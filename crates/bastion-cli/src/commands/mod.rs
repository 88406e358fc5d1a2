// SPDX-License-Identifier: Apache-2.0

//! Command handlers for Bastion CLI.

pub mod completion;
pub mod config;
pub mod connect;
pub mod fetch;
pub mod file;
pub mod types;

use std::path::Path;

use anyhow::{Result, bail};
use bastion_core::AppConfig;

use crate::cli::{Commands, CompletionCommand, ConfigCommand, OutputContext};
use crate::output;

/// Dispatch to the appropriate command handler.
pub async fn run(
    command: Commands,
    ctx: OutputContext,
    config: &AppConfig,
    config_source: &Path,
) -> Result<()> {
    match command {
        Commands::Connect { descriptor } => {
            let result = connect::run(&descriptor, config).await?;
            output::render(&result, &ctx)
        }

        Commands::File(args) => file::run(args, &ctx, config).await,

        Commands::Fetch { id, no_enrich } => {
            let result = fetch::run(&id, !no_enrich, config).await?;
            output::render(&result, &ctx)
        }

        Commands::FetchBatch { ids } => {
            let result = fetch::run_batch(&ids, config).await?;
            output::render(&result, &ctx)?;
            let failures = result.failures();
            if failures > 0 {
                bail!("{failures} of {} fetches failed", result.results.len());
            }
            Ok(())
        }

        Commands::Config(ConfigCommand::Show) => {
            let result = config::run_show(config, config_source);
            output::render(&result, &ctx)
        }

        Commands::Completion(CompletionCommand::Generate { shell }) => {
            completion::run_generate(shell);
            Ok(())
        }
    }
}
