//! Provider session: model selection and readiness over a [`ModelProviderClient`].

use super::catalog::{ProviderCatalog, MAX_PROBED_MODELS};
use super::{ChatMessage, CompletionOptions, ModelProviderClient, ProviderConfig, ProviderType};
use crate::error::ApiError;
use crate::generation::{RemoteCall, RetryConfig};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PROBE_PROMPT: &str = "Hello, respond with just 'OK'";

/// Readiness of a session. Calls are only legal once `Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready { model: String },
}

/// One configured provider, bound to a client.
pub struct ProviderSession {
    name: String,
    provider_type: ProviderType,
    configured_model: Option<String>,
    widget_name: String,
    structured_payload: bool,
    options: CompletionOptions,
    retry: Option<RetryConfig>,
    client: Arc<dyn ModelProviderClient>,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSession")
            .field("name", &self.name)
            .field("provider_type", &self.provider_type)
            .field("state", &*self.state.read())
            .finish()
    }
}

impl ProviderSession {
    pub fn new(name: &str, config: &ProviderConfig, client: Arc<dyn ModelProviderClient>) -> Self {
        Self {
            name: name.to_string(),
            provider_type: config.provider_type,
            configured_model: config.model.clone(),
            widget_name: config.widget_name(),
            structured_payload: config.expects_structured_payload(),
            options: config.completion_options(),
            retry: config.retry.clone(),
            client,
            state: RwLock::new(SessionState::Uninitialized),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider_type(&self) -> ProviderType {
        self.provider_type
    }

    pub fn widget_name(&self) -> &str {
        &self.widget_name
    }

    pub fn expects_structured_payload(&self) -> bool {
        self.structured_payload
    }

    /// Per-provider retry override, if configured.
    pub fn retry_override(&self) -> Option<&RetryConfig> {
        self.retry.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Selected model, once ready.
    pub fn model(&self) -> Option<String> {
        match &*self.state.read() {
            SessionState::Ready { model } => Some(model.clone()),
            SessionState::Uninitialized => None,
        }
    }

    fn catalog(&self) -> &'static ProviderCatalog {
        self.provider_type.catalog()
    }

    /// Select a working model and move to `Ready`. Returns the chosen model.
    ///
    /// A configured model is probed alone. Otherwise the provider's listing is ranked and
    /// up to [`MAX_PROBED_MODELS`] candidates are probed in order.
    pub async fn initialize(&self) -> Result<String, ApiError> {
        if let Some(model) = self.model() {
            return Ok(model);
        }

        let candidates = match &self.configured_model {
            Some(model) => vec![model.clone()],
            None => self.candidate_models().await,
        };

        for model in candidates.iter().take(MAX_PROBED_MODELS) {
            match self.probe(model).await {
                Ok(()) => {
                    info!(provider = %self.name, model = %model, "Provider session ready");
                    *self.state.write() = SessionState::Ready {
                        model: model.clone(),
                    };
                    return Ok(model.clone());
                }
                Err(err) => {
                    warn!(provider = %self.name, model = %model, error = %err, "Model probe failed");
                }
            }
        }

        Err(ApiError::ProviderNotInitialized(format!(
            "{}: no working model among {} candidate(s)",
            self.name,
            candidates.len().min(MAX_PROBED_MODELS)
        )))
    }

    async fn candidate_models(&self) -> Vec<String> {
        let catalog = self.catalog();
        let listed = match self.client.list_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => {
                warn!(provider = %self.name, "Model listing was empty; using known models");
                fallback_list(catalog)
            }
            Err(err) => {
                warn!(provider = %self.name, error = %err, "Model listing failed; using known models");
                fallback_list(catalog)
            }
        };
        let ranked = catalog.rank_models(listed);
        debug!(provider = %self.name, candidates = ?ranked, "Ranked candidate models");
        ranked
    }

    async fn probe(&self, model: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .complete(
                model,
                vec![ChatMessage::user(PROBE_PROMPT)],
                &CompletionOptions::probe(),
            )
            .await?;
        if response.content.trim().is_empty() {
            return Err(ApiError::ProviderError(format!(
                "{} returned an empty probe response",
                model
            )));
        }
        Ok(())
    }

    /// Models the provider reports as available.
    pub async fn list_models(&self) -> Result<Vec<String>, ApiError> {
        self.client.list_models().await
    }
}

fn fallback_list(catalog: &ProviderCatalog) -> Vec<String> {
    catalog
        .fallback_models
        .iter()
        .map(|m| m.to_string())
        .collect()
}

#[async_trait]
impl RemoteCall for ProviderSession {
    async fn call(&self, prompt: &str) -> Result<String, ApiError> {
        let model = self.model().ok_or_else(|| {
            ApiError::ProviderNotInitialized(format!("{}: call before initialize", self.name))
        })?;
        let response = self
            .client
            .complete(&model, vec![ChatMessage::user(prompt)], &self.options)
            .await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_support::MockProvider;

    fn session(config: ProviderConfig, mock: MockProvider) -> (ProviderSession, Arc<MockProvider>) {
        let mock = Arc::new(mock);
        let session = ProviderSession::new("groq", &config, mock.clone());
        (session, mock)
    }

    #[tokio::test]
    async fn test_initialize_probes_ranked_models() {
        let (session, mock) = session(
            ProviderConfig::new(ProviderType::Groq),
            MockProvider::new(
                &[
                    "whisper-large-v3",
                    "new-model",
                    "llama-3.1-8b-instant",
                    "llama-3.3-70b-versatile",
                ],
                &["llama-3.1-8b-instant"],
            ),
        );
        let model = session.initialize().await.unwrap();
        assert_eq!(model, "llama-3.1-8b-instant");
        assert_eq!(
            mock.probed_models(),
            vec!["llama-3.3-70b-versatile", "llama-3.1-8b-instant"]
        );
        assert_eq!(
            session.state(),
            SessionState::Ready {
                model: "llama-3.1-8b-instant".into()
            }
        );
    }

    #[tokio::test]
    async fn test_listing_failure_uses_known_models() {
        let mut mock = MockProvider::new(&[], &["mixtral-8x7b-32768"]);
        mock.models = Err("listing down".into());
        let (session, mock) = session(ProviderConfig::new(ProviderType::Groq), mock);
        assert_eq!(session.initialize().await.unwrap(), "mixtral-8x7b-32768");
        assert_eq!(mock.probed_models().len(), 3);
    }

    #[tokio::test]
    async fn test_probes_at_most_five_candidates() {
        let listed = ["a1", "a2", "a3", "a4", "a5", "a6", "a7"];
        let (session, mock) = session(
            ProviderConfig::new(ProviderType::Groq),
            MockProvider::new(&listed, &["a7"]),
        );
        let err = session.initialize().await.unwrap_err();
        assert!(matches!(err, ApiError::ProviderNotInitialized(_)));
        assert_eq!(mock.probed_models().len(), MAX_PROBED_MODELS);
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_configured_model_is_probed_alone() {
        let mut config = ProviderConfig::new(ProviderType::Groq);
        config.model = Some("pinned".into());
        let (session, mock) = session(config, MockProvider::new(&["other"], &["pinned", "other"]));
        assert_eq!(session.initialize().await.unwrap(), "pinned");
        assert_eq!(mock.probed_models(), vec!["pinned"]);
    }

    #[tokio::test]
    async fn test_call_before_initialize_is_contract_violation() {
        let (session, mock) = session(
            ProviderConfig::new(ProviderType::Groq),
            MockProvider::new(&["m"], &["m"]),
        );
        let err = session.call("hi").await.unwrap_err();
        assert!(err.is_contract_violation());
        assert!(mock.requests.lock().is_empty());
    }

    #[tokio::test]
    async fn test_call_uses_generation_options() {
        let (session, mock) = session(
            ProviderConfig::new(ProviderType::Groq),
            MockProvider::new(&["llama-3.3-70b-versatile"], &["llama-3.3-70b-versatile"])
                .with_replies(vec![Ok("class X {}".into())]),
        );
        session.initialize().await.unwrap();
        assert_eq!(session.call("make a card").await.unwrap(), "class X {}");
        let last = mock.requests.lock().last().cloned().unwrap();
        assert_eq!(last, ("llama-3.3-70b-versatile".to_string(), 8192));
    }
}
