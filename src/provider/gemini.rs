//! Gemini `generateContent` client.

use super::{
    build_provider_http_client, error_from_response, map_http_error, ChatMessage,
    CompletionOptions, CompletionResponse, MessageRole, ModelProviderClient,
};
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct GeminiClient {
    client: Client,
    name: String,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GeminiClient {
    pub fn new(name: String, base_url: String, api_key: String) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_provider_http_client()?,
            name,
            base_url,
            api_key,
        })
    }

    fn build_request(messages: Vec<ChatMessage>, options: &CompletionOptions) -> GenerateContentRequest {
        let mut system = Vec::new();
        let mut contents = Vec::new();
        for msg in messages {
            let part = Part { text: msg.content };
            match msg.role {
                MessageRole::System => system.push(part),
                MessageRole::User => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
                MessageRole::Assistant => contents.push(Content {
                    role: Some("model".to_string()),
                    parts: vec![part],
                }),
            }
        }
        GenerateContentRequest {
            contents,
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: system,
            }),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                top_k: options.top_k,
                max_output_tokens: options.max_tokens,
            },
        }
    }
}

#[async_trait]
impl ModelProviderClient for GeminiClient {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        let request = Self::build_request(messages, options);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))?;

        let candidate = generated
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::ProviderError("No candidates in response".to_string()))?;
        let content = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: generated.model_version.unwrap_or_else(|| model.to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
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
        #[serde(rename_all = "camelCase")]
        struct ModelInfo {
            name: String,
            #[serde(default)]
            supported_generation_methods: Vec<String>,
        }

        let models: ModelsResponse = response.json().await.map_err(|e| {
            ApiError::ProviderError(format!("Failed to parse models response: {}", e))
        })?;

        Ok(models
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(|m| strip_model_prefix(&m.name).to_string())
            .collect())
    }
}

/// `models/gemini-1.5-flash` -> `gemini-1.5-flash`
fn strip_model_prefix(name: &str) -> &str {
    name.strip_prefix("models/").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_messages_become_instruction() {
        let request = GeminiClient::build_request(
            vec![
                ChatMessage {
                    role: MessageRole::System,
                    content: "be brief".into(),
                },
                ChatMessage::user("hello"),
            ],
            &CompletionOptions {
                max_tokens: Some(10),
                ..CompletionOptions::empty()
            },
        );
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 10);
        assert!(body["generationConfig"].get("topK").is_none());
    }

    #[test]
    fn test_strip_model_prefix() {
        assert_eq!(strip_model_prefix("models/gemini-1.5-pro"), "gemini-1.5-pro");
        assert_eq!(strip_model_prefix("gemini-pro"), "gemini-pro");
    }
}
