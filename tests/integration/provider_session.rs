//! Provider sessions driven through the generation service with an in-process client.

use super::test_utils::{InstantSleeper, MemorySink};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use widgetforge::generation::{GenerationService, RetryConfig, RetryExecutor};
use widgetforge::provider::{
    ChatMessage, CompletionOptions, CompletionResponse, ModelProviderClient, ProviderConfig,
    ProviderSession, ProviderType, SessionState,
};
use widgetforge::ApiError;

/// Lists a fixed set of models; only `working` answers.
struct FakeCohere {
    working: &'static str,
    reply: &'static str,
    seen_models: Mutex<Vec<String>>,
}

#[async_trait]
impl ModelProviderClient for FakeCohere {
    async fn complete(
        &self,
        model: &str,
        _messages: Vec<ChatMessage>,
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, ApiError> {
        self.seen_models.lock().push(model.to_string());
        if model != self.working {
            return Err(ApiError::ProviderModelNotFound(format!("404 {}", model)));
        }
        Ok(CompletionResponse {
            content: self.reply.to_string(),
            model: model.to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "cohere"
    }

    async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        Ok(vec![
            "embed-english-v3.0".to_string(),
            "command-light".to_string(),
            "command-r".to_string(),
            "rerank-v3.5".to_string(),
        ])
    }
}

fn executor() -> RetryExecutor {
    RetryExecutor::new(Arc::new(RetryConfig::default()))
        .with_sleeper(Arc::new(InstantSleeper::default()))
}

#[tokio::test]
async fn test_session_selects_model_and_generates() {
    let client = Arc::new(FakeCohere {
        working: "command-light",
        reply: r#"{"code": "class GeneratedWidget extends StatelessWidget {\n}", "ui_json": "{\"type\": \"Card\"}"}"#,
        seen_models: Mutex::new(Vec::new()),
    });
    let session = Arc::new(ProviderSession::new(
        "cohere",
        &ProviderConfig::new(ProviderType::Cohere),
        client.clone(),
    ));
    let sink = Arc::new(MemorySink::default());
    let service = GenerationService::from_session(session.clone(), executor(), sink.clone());

    service.initialize().await.unwrap();
    assert_eq!(
        session.state(),
        SessionState::Ready {
            model: "command-light".to_string()
        }
    );
    // command-r ranks ahead of command-light; embed and rerank models are never probed.
    let seen = client.seen_models.lock().clone();
    assert_eq!(seen, vec!["command-r", "command-light"]);

    let request = service.request("an info card").unwrap();
    let result = service.generate(&request).await.unwrap();
    assert!(result.success);
    assert_eq!(result.identifier_name, "CohereGeneratedWidget");
    assert_eq!(result.model.as_deref(), Some("command-light"));
    assert!(result.code.contains("class CohereGeneratedWidget extends StatelessWidget"));
    assert_eq!(result.aux_structure.unwrap()["type"], "Card");
}

#[tokio::test]
async fn test_uninitialized_session_is_contract_error() {
    let client = Arc::new(FakeCohere {
        working: "command-r",
        reply: "x",
        seen_models: Mutex::new(Vec::new()),
    });
    let session = Arc::new(ProviderSession::new(
        "cohere",
        &ProviderConfig::new(ProviderType::Cohere),
        client,
    ));
    let sink = Arc::new(MemorySink::default());
    let service = GenerationService::from_session(session, executor(), sink.clone());

    let request = service.request("a card").unwrap();
    let err = service.generate(&request).await.unwrap_err();
    assert!(matches!(err, ApiError::ProviderNotInitialized(_)));
    assert!(sink.writes.lock().is_empty());
}
