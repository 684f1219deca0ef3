//! Dispatch one prompt to several providers at once.

use super::service::GenerationService;
use crate::error::ApiError;
use crate::types::GenerationResult;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// `[fan_out]` in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutSettings {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Explicit provider order; all configured providers by name when absent.
    #[serde(default)]
    pub providers: Option<Vec<String>>,
}

fn default_max_workers() -> usize {
    4
}

impl Default for FanOutSettings {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            providers: None,
        }
    }
}

/// Outcome for one provider. A provider that could not start carries `error` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutEntry {
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run every service on `prompt`, at most `max_workers` at a time.
///
/// Entries come back in the order of `services` once all have finished. A provider whose
/// initialization fails is reported in its entry and does not affect the others.
pub async fn fan_out(
    services: &[GenerationService],
    prompt: &str,
    max_workers: usize,
) -> Result<Vec<FanOutEntry>, ApiError> {
    if prompt.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Prompt cannot be empty".to_string()));
    }
    let workers = max_workers.max(1);
    info!(providers = services.len(), workers, "Fanning out prompt");

    let entries = stream::iter(services.iter().map(|service| run_one(service, prompt)))
        .buffered(workers)
        .collect::<Vec<_>>()
        .await;
    Ok(entries)
}

async fn run_one(service: &GenerationService, prompt: &str) -> FanOutEntry {
    let provider = service.name().to_string();
    let outcome = async {
        service.initialize().await?;
        let request = service.request(prompt)?;
        service.generate(&request).await
    }
    .await;

    match outcome {
        Ok(result) => FanOutEntry {
            provider,
            result: Some(result),
            error: None,
        },
        Err(err) => {
            warn!(provider = %provider, error = %err, "Provider did not produce a result");
            FanOutEntry {
                provider,
                result: None,
                error: Some(err.to_string()),
            }
        }
    }
}
