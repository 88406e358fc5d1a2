// SPDX-License-Identifier: Apache-2.0

//! `bastion fetch` and `bastion fetch-batch`.

use anyhow::Result;
use bastion_core::{ApiClient, AppConfig};
use serde_json::Value;

use super::types::{BatchItem, BatchResult, FetchOutput};

/// Fetches one user, following its enrichment reference unless `enrich` is false.
pub async fn run(id: &str, enrich: bool, config: &AppConfig) -> Result<FetchOutput> {
    let client = ApiClient::new(&config.api)?;

    let (user, enriched) = if enrich {
        let result = client.fetch_enriched(id).await?;
        let enriched = result.details().is_some();
        (result.into_merged(), enriched)
    } else {
        (Value::Object(client.fetch(id).await?), false)
    };

    Ok(FetchOutput {
        id: id.to_string(),
        enriched,
        user,
    })
}

/// Fetches several users; individual failures are reported per id.
pub async fn run_batch(ids: &[String], config: &AppConfig) -> Result<BatchResult> {
    let client = ApiClient::new(&config.api)?;
    let results = client.fetch_batch(ids).await;

    let results = ids
        .iter()
        .zip(results)
        .map(|(id, result)| match result {
            Ok(user) => BatchItem {
                id: id.clone(),
                user: Some(Value::Object(user)),
                error: None,
            },
            Err(e) => BatchItem {
                id: id.clone(),
                user: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Ok(BatchResult { results })
}
