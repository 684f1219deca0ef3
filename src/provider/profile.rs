//! Provider configuration entries, `[providers.<name>]` in the config file.

use super::catalog::ProviderCatalog;
use super::CompletionOptions;
use crate::error::ApiError;
use crate::generation::RetryConfig;
use crate::types::is_type_identifier;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Gemini,
    Groq,
    Cohere,
    #[serde(alias = "hugging_face")]
    HuggingFace,
    #[serde(alias = "open_router")]
    OpenRouter,
    #[serde(alias = "chatgpt")]
    OpenAI,
    Ollama,
}

impl ProviderType {
    pub const ALL: [ProviderType; 7] = [
        ProviderType::Gemini,
        ProviderType::Groq,
        ProviderType::Cohere,
        ProviderType::HuggingFace,
        ProviderType::OpenRouter,
        ProviderType::OpenAI,
        ProviderType::Ollama,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini",
            ProviderType::Groq => "groq",
            ProviderType::Cohere => "cohere",
            ProviderType::HuggingFace => "huggingface",
            ProviderType::OpenRouter => "openrouter",
            ProviderType::OpenAI => "openai",
            ProviderType::Ollama => "ollama",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ApiError> {
        let lowered = value.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.slug() == lowered)
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "Invalid provider type: {}. Must be one of gemini, groq, cohere, huggingface, openrouter, openai, ollama",
                    value
                ))
            })
    }

    pub fn catalog(&self) -> &'static ProviderCatalog {
        ProviderCatalog::for_type(*self)
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// One configured provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,

    /// Pin a model; when absent `initialize` picks one.
    #[serde(default)]
    pub model: Option<String>,

    /// Inline key. Prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Base URL override.
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub widget_name: Option<String>,

    #[serde(default)]
    pub structured_payload: Option<bool>,

    #[serde(default)]
    pub generation: Option<CompletionOptions>,

    /// Overrides the global `[retry]` table for this provider.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl ProviderConfig {
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            model: None,
            api_key: None,
            api_key_env: None,
            endpoint: None,
            widget_name: None,
            structured_payload: None,
            generation: None,
            retry: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err("Model name cannot be empty".to_string());
            }
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }
        if let Some(name) = &self.widget_name {
            if !is_type_identifier(name) {
                return Err(format!("Invalid widget name: {}", name));
            }
        }
        if let Some(options) = &self.generation {
            options.validate()?;
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        Ok(())
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.provider_type.catalog().default_endpoint.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn widget_name(&self) -> String {
        self.widget_name
            .clone()
            .unwrap_or_else(|| self.provider_type.catalog().widget_name.to_string())
    }

    pub fn expects_structured_payload(&self) -> bool {
        self.structured_payload
            .unwrap_or(self.provider_type.catalog().structured_payload)
    }

    /// Catalog defaults overlaid with configured options.
    pub fn completion_options(&self) -> CompletionOptions {
        let defaults = self.provider_type.catalog().default_options();
        match &self.generation {
            Some(options) => options.overlay(&defaults),
            None => defaults,
        }
    }

    /// Env var consulted for the key: the configured one, else the provider's convention.
    pub fn api_key_env_var(&self) -> Option<String> {
        self.api_key_env
            .clone()
            .or_else(|| self.provider_type.catalog().api_key_env.map(str::to_string))
    }

    /// Explicit key, then the configured env var, then the conventional one.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        let mut vars = Vec::new();
        if let Some(var) = &self.api_key_env {
            vars.push(var.clone());
        }
        if let Some(var) = self.provider_type.catalog().api_key_env {
            vars.push(var.to_string());
        }
        vars.into_iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
    }

    pub fn requires_api_key(&self) -> bool {
        self.provider_type.catalog().api_key_env.is_some()
    }
}
