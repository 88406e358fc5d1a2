// SPDX-License-Identifier: Apache-2.0

//! `bastion file` subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use bastion_core::{AppConfig, FileStore};
use tokio::io::AsyncReadExt;

use super::types::{FileListResult, FileReadResult, FileRemoveResult, FileWriteResult};
use crate::cli::{FileArgs, FileCommand, OutputContext};
use crate::output;

/// Runs a file subcommand against the configured (or overridden) root.
pub async fn run(args: FileArgs, ctx: &OutputContext, config: &AppConfig) -> Result<()> {
    let store = open_store(args.root, config).await?;

    match args.command {
        FileCommand::Read { path } => {
            let bytes = store.read(&path).await?;
            let result = FileReadResult {
                size: bytes.len(),
                content: String::from_utf8_lossy(&bytes).into_owned(),
                path,
                bytes,
            };
            output::render(&result, ctx)
        }
        FileCommand::Write { path, content } => {
            let bytes = match content {
                Some(text) => text.into_bytes(),
                None => read_stdin().await?,
            };
            let outcome = store.write(&path, &bytes).await?;
            let result = FileWriteResult {
                path,
                bytes_written: outcome.bytes_written,
                replaced: outcome.replaced,
            };
            output::render(&result, ctx)
        }
        FileCommand::List { dir } => {
            let dir = dir.unwrap_or_default();
            let entries = store.list_dir(&dir).await?;
            output::render(&FileListResult { dir, entries }, ctx)
        }
        FileCommand::Remove { path } => {
            store.remove(&path).await?;
            output::render(&FileRemoveResult { path }, ctx)
        }
    }
}

async fn open_store(root: Option<PathBuf>, config: &AppConfig) -> Result<FileStore> {
    let root = root.or_else(|| config.store.root.clone()).ok_or_else(|| {
        anyhow!("No store root configured\n\nTip: Pass --root or set store.root in your config file.")
    })?;
    Ok(FileStore::open(root).await?)
}

async fn read_stdin() -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut buf)
        .await
        .context("Failed to read content from stdin")?;
    Ok(buf)
}
