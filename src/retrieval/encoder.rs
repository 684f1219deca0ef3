//! Query encoders turning text into embedding vectors.

use crate::error::ApiError;
use crate::provider::{build_provider_http_client, map_http_error, status_error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_HASHING_DIMENSION: usize = 256;

/// Embeds a query into the corpus vector space.
#[async_trait]
pub trait QueryEncoder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, ApiError>;

    /// Name recorded in corpora built with this encoder.
    fn model_name(&self) -> &str;
}

/// Encoder selection, `retrieval.encoder` in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncoderConfig {
    Hashing {
        #[serde(default = "default_dimension")]
        dimension: usize,
    },
    /// OpenAI-compatible `/embeddings` endpoint.
    Http {
        endpoint: String,
        model: String,
        #[serde(default)]
        api_key_env: Option<String>,
    },
}

fn default_dimension() -> usize {
    DEFAULT_HASHING_DIMENSION
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig::Hashing {
            dimension: DEFAULT_HASHING_DIMENSION,
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            EncoderConfig::Hashing { dimension } if *dimension == 0 => {
                Err("Hashing encoder dimension must be positive".to_string())
            }
            EncoderConfig::Http { endpoint, .. }
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") =>
            {
                Err(format!("Invalid encoder endpoint URL: {}", endpoint))
            }
            EncoderConfig::Http { model, .. } if model.trim().is_empty() => {
                Err("Encoder model cannot be empty".to_string())
            }
            _ => Ok(()),
        }
    }

    pub fn build(&self) -> Result<Box<dyn QueryEncoder>, ApiError> {
        match self {
            EncoderConfig::Hashing { dimension } => Ok(Box::new(HashingEncoder::new(*dimension)?)),
            EncoderConfig::Http {
                endpoint,
                model,
                api_key_env,
            } => {
                let api_key = api_key_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok());
                Ok(Box::new(HttpEncoder::new(
                    endpoint.clone(),
                    model.clone(),
                    api_key,
                )?))
            }
        }
    }
}

/// Deterministic feature-hashing encoder.
///
/// Tokens are NFKC-normalised, lowercased runs of alphanumerics; each lands in one of
/// `dimension` buckets chosen by its blake3 hash, with a hash-derived sign. The result is
/// L2-normalised, or all zeros when the text has no tokens.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimension: usize,
    model_name: String,
}

impl HashingEncoder {
    pub fn new(dimension: usize) -> Result<Self, ApiError> {
        if dimension == 0 {
            return Err(ApiError::ConfigError(
                "Hashing encoder dimension must be positive".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            model_name: format!("hashing-{}", dimension),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Synchronous form of [`QueryEncoder::encode`].
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];
        let normalized: String = text.nfkc().collect::<String>().to_lowercase();

        for token in normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&bytes[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl QueryEncoder for HashingEncoder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        Ok(self.embed(text))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Remote encoder speaking the OpenAI `/embeddings` wire format.
pub struct HttpEncoder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEncoder {
    pub fn new(endpoint: String, model: String, api_key: Option<String>) -> Result<Self, ApiError> {
        let client = build_provider_http_client()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }
}

#[async_trait]
impl QueryEncoder for HttpEncoder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingData>,
        }
        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.endpoint);
        let mut request = self
            .client
            .post(&url)
            .json(&json!({"model": self.model, "input": text}));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }
        let response = request.send().await.map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &error_text));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            ApiError::ProviderError(format!("Failed to parse embeddings response: {}", e))
        })?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ApiError::ProviderError("No embeddings in response".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
