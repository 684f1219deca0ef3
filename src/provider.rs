//! Model Provider Abstraction
//!
//! Unified interface over the hosted model APIs used for widget generation. Three wire
//! families cover every supported provider: OpenAI-compatible chat completions (Groq,
//! OpenRouter, Hugging Face router, OpenAI, Ollama), Gemini `generateContent` and Cohere v2
//! chat. [`ProviderSession`] layers model selection and readiness on top of a client.

use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub mod catalog;
pub mod cohere;
pub mod gemini;
pub mod openai_compat;
pub mod profile;
pub mod session;

pub use catalog::ProviderCatalog;
pub use profile::{ProviderConfig, ProviderType};
pub use session::{ProviderSession, SessionState};

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Sampling options, `[providers.<name>.generation]` in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub top_k: Option<u32>,
    #[serde(default, alias = "max_output_tokens")]
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.3),
            top_p: Some(0.9),
            top_k: Some(40),
            max_tokens: Some(4096),
        }
    }
}

impl CompletionOptions {
    pub fn empty() -> Self {
        Self {
            temperature: None,
            top_p: None,
            top_k: None,
            max_tokens: None,
        }
    }

    /// Short request used to probe whether a model answers.
    pub fn probe() -> Self {
        Self {
            temperature: Some(0.5),
            top_p: Some(0.9),
            top_k: None,
            max_tokens: Some(10),
        }
    }

    /// Fields set here win over `base`.
    pub fn overlay(&self, base: &CompletionOptions) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature.or(base.temperature),
            top_p: self.top_p.or(base.top_p),
            top_k: self.top_k.or(base.top_k),
            max_tokens: self.max_tokens.or(base.max_tokens),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("temperature must be within 0.0-2.0, got {}", t));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("top_p must be within 0.0-1.0, got {}", p));
            }
        }
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be positive".to_string());
        }
        Ok(())
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages with the given model.
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ApiError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// List available models from the provider
    async fn list_models(&self) -> Result<Vec<String>, ApiError>;
}

/// Map a non-success HTTP status to an error. The status code always appears in the
/// message so retry classification can see it.
pub fn status_error(status: StatusCode, body: &str) -> ApiError {
    let code = status.as_u16();
    match code {
        401 | 403 => ApiError::ProviderAuthFailed(format!("{} {}", code, body)),
        404 => ApiError::ProviderModelNotFound(format!("{} {}", code, body)),
        429 => ApiError::ProviderRateLimit(body.to_string()),
        503 => ApiError::ProviderOverloaded(body.to_string()),
        _ => ApiError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, body
        )),
    }
}

// Helper function to map HTTP errors to ApiError
pub(crate) fn map_http_error(error: reqwest::Error) -> ApiError {
    if let Some(status) = error.status() {
        status_error(status, &error.to_string())
    } else if error.is_timeout() {
        ApiError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ApiError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        ApiError::ProviderError(format!("HTTP error: {}", error))
    }
}

/// Read the body of a failed response and map it.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    status_error(status, &error_text)
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) fn build_provider_http_client() -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// Provider factory for creating provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        name: &str,
        config: &ProviderConfig,
    ) -> Result<Box<dyn ModelProviderClient>, ApiError> {
        let api_key = config.resolve_api_key();
        if api_key.is_none() && config.requires_api_key() {
            return Err(ApiError::ProviderNotConfigured(format!(
                "{}: no API key (set {})",
                name,
                config
                    .api_key_env_var()
                    .unwrap_or_else(|| "api_key".to_string())
            )));
        }
        let endpoint = config.endpoint();

        match config.provider_type {
            ProviderType::Gemini => Ok(Box::new(gemini::GeminiClient::new(
                name.to_string(),
                endpoint,
                api_key.unwrap_or_default(),
            )?)),
            ProviderType::Cohere => Ok(Box::new(cohere::CohereClient::new(
                name.to_string(),
                endpoint,
                api_key.unwrap_or_default(),
            )?)),
            ProviderType::Groq
            | ProviderType::HuggingFace
            | ProviderType::OpenRouter
            | ProviderType::OpenAI
            | ProviderType::Ollama => Ok(Box::new(openai_compat::OpenAICompatibleClient::new(
                name.to_string(),
                endpoint,
                api_key,
            )?)),
        }
    }

    /// Client plus session for a configured provider.
    pub fn create_session(name: &str, config: &ProviderConfig) -> Result<ProviderSession, ApiError> {
        let client = Self::create_client(name, config)?;
        Ok(ProviderSession::new(name, config, Arc::from(client)))
    }
}

/// Provider registry: configured providers by name, in name order.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load providers from configuration
    pub fn load_from_config(config: &crate::config::ForgeConfig) -> Self {
        Self {
            providers: config.providers.clone(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, config: ProviderConfig) {
        self.providers.insert(name.into(), config);
    }

    /// Get a provider configuration by name
    pub fn get(&self, provider_name: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider_name)
    }

    /// Get a provider configuration by name or return an error
    pub fn get_or_error(&self, provider_name: &str) -> Result<&ProviderConfig, ApiError> {
        self.get(provider_name).ok_or_else(|| {
            ApiError::ProviderNotConfigured(format!("Provider not found: {}", provider_name))
        })
    }

    /// Configured providers, ordered by name.
    pub fn list_all(&self) -> Vec<(&str, &ProviderConfig)> {
        self.providers
            .iter()
            .map(|(name, config)| (name.as_str(), config))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn create_session(&self, provider_name: &str) -> Result<ProviderSession, ApiError> {
        let config = self.get_or_error(provider_name)?;
        ProviderFactory::create_session(provider_name, config)
    }
}
