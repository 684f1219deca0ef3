//! Error types for the widget generation pipeline.

use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced by providers, the retrieval path and the outer surfaces.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// The provider session was called before `initialize` selected a model.
    #[error("Provider not initialized: {0}")]
    ProviderNotInitialized(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider overloaded (503): {0}")]
    ProviderOverloaded(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded (429): {0}")]
    ProviderRateLimit(String),

    #[error("Provider model not found: {0}")]
    ProviderModelNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The retriever was queried before a corpus was loaded.
    #[error("Retriever not loaded: {0}")]
    RetrieverNotLoaded(String),

    #[error("Corpus error: {0}")]
    CorpusError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// Setup bugs that must reach the caller instead of being absorbed into a fallback.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ApiError::ProviderNotInitialized(_) | ApiError::RetrieverNotLoaded(_)
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::StorageError(StorageError::IoError(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_classes() {
        assert!(ApiError::ProviderNotInitialized("gemini".into()).is_contract_violation());
        assert!(ApiError::RetrieverNotLoaded("corpus".into()).is_contract_violation());
        assert!(!ApiError::ProviderRateLimit("slow down".into()).is_contract_violation());
        assert!(!ApiError::CorpusError("bad rows".into()).is_contract_violation());
    }

    #[test]
    fn test_status_codes_survive_display() {
        let err = ApiError::ProviderOverloaded("model busy".into());
        assert!(err.to_string().contains("503"));
        let err = ApiError::ProviderRateLimit("quota".into());
        assert!(err.to_string().contains("429"));
    }
}
