// SPDX-License-Identifier: Apache-2.0

//! `bastion connect`.

use anyhow::Result;
use bastion_core::{AppConfig, ConnectionDescriptor, Connector};
use tokio::time::Instant;
use tracing::debug;

use super::types::ConnectResult;

/// Opens a connection with the configured budget, then closes it.
pub async fn run(descriptor: &str, config: &AppConfig) -> Result<ConnectResult> {
    let descriptor = ConnectionDescriptor::parse(descriptor)?;
    let connector = Connector::new(&config.connector);

    let deadline = Instant::now() + config.connector.connect_timeout();
    let mut handle = connector.connect_descriptor(&descriptor, deadline).await?;
    debug!(id = %handle.id(), "Connected, closing");

    let status = handle.close();
    Ok(ConnectResult {
        descriptor: descriptor.to_string(),
        id: handle.id().to_string(),
        host: handle.host().to_string(),
        opened_at: handle.opened_at(),
        status,
    })
}
