//! Cohere v2 chat client.

use super::{
    build_provider_http_client, error_from_response, map_http_error, ChatMessage,
    CompletionOptions, CompletionResponse, ModelProviderClient,
};
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct CohereClient {
    client: Client,
    name: String,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct CohereMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<CohereMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "p", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(rename = "k", skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl CohereClient {
    pub fn new(name: String, base_url: String, api_key: String) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_provider_http_client()?,
            name,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl ModelProviderClient for CohereClient {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: messages
                .into_iter()
                .map(|msg| CohereMessage {
                    role: msg.role.as_str().to_string(),
                    content: msg.content,
                })
                .collect(),
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let url = format!("{}/v2/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))?;

        let content = chat
            .message
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: model.to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/v1/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("endpoint", "chat")])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        #[derive(Deserialize)]
        struct ModelsResponse {
            #[serde(default)]
            models: Vec<ModelInfo>,
        }
        #[derive(Deserialize)]
        struct ModelInfo {
            name: String,
        }

        let models: ModelsResponse = response.json().await.map_err(|e| {
            ApiError::ProviderError(format!("Failed to parse models response: {}", e))
        })?;

        Ok(models.models.into_iter().map(|m| m.name).collect())
    }
}
