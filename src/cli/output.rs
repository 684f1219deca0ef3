//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;
use serde::Serialize;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ProviderNotConfigured(_) => format!(
            "{}\n\nAdd the provider under [providers.<name>] in config/config.toml or set its API key.",
            e
        ),
        ApiError::ProviderNotInitialized(_) => format!(
            "{}\n\nCheck the API key and run 'widgetforge models --provider <name>' to see available models.",
            e
        ),
        _ => e.to_string(),
    }
}

/// Pretty JSON for command results.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode output: {}", e)))
}
