//! Generation and retrieval services: the caller-facing pipelines.
//!
//! Both produce a [`GenerationResult`] for every request that passes the contract checks.
//! Remote failures, malformed payloads and missing matches all end in the fallback
//! artifact; only contract violations come back as `Err`.

use super::executor::{RemoteCall, RetryError, RetryExecutor};
use super::prompt::build_prompt;
use crate::error::ApiError;
use crate::fallback::get_fallback;
use crate::payload;
use crate::provider::ProviderSession;
use crate::retrieval::SimilarityRetriever;
use crate::sanitize::{enforce_identifier, extract_payload, sanitize};
use crate::sink::ArtifactSink;
use crate::types::{AuxStructure, GenerationRequest, GenerationResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Widget name used for corpus hits.
pub const TRAINING_MODEL_IDENTIFIER: &str = "TrainingModelGeneratedWidget";

const TRAINING_MODEL_SERVICE: &str = "training_model";

/// Pipeline for one remote provider.
pub struct GenerationService {
    name: String,
    widget_name: String,
    structured: bool,
    remote: Arc<dyn RemoteCall>,
    session: Option<Arc<ProviderSession>>,
    executor: RetryExecutor,
    sink: Arc<dyn ArtifactSink>,
}

impl GenerationService {
    pub fn new(
        name: impl Into<String>,
        widget_name: impl Into<String>,
        structured: bool,
        remote: Arc<dyn RemoteCall>,
        executor: RetryExecutor,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            name: name.into(),
            widget_name: widget_name.into(),
            structured,
            remote,
            session: None,
            executor,
            sink,
        }
    }

    pub fn from_session(
        session: Arc<ProviderSession>,
        executor: RetryExecutor,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            name: session.name().to_string(),
            widget_name: session.widget_name().to_string(),
            structured: session.expects_structured_payload(),
            remote: session.clone(),
            session: Some(session),
            executor,
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Provider's default widget name.
    pub fn widget_name(&self) -> &str {
        &self.widget_name
    }

    pub fn expects_structured_payload(&self) -> bool {
        self.structured
    }

    /// Select a model for session-backed services; a no-op otherwise.
    pub async fn initialize(&self) -> Result<(), ApiError> {
        if let Some(session) = &self.session {
            session.initialize().await?;
        }
        Ok(())
    }

    fn model(&self) -> Option<String> {
        self.session.as_ref().and_then(|s| s.model())
    }

    /// Request for `prompt` under the provider's default widget name.
    pub fn request(&self, prompt: &str) -> Result<GenerationRequest, ApiError> {
        GenerationRequest::new(prompt, self.widget_name.clone())
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, ApiError> {
        let identifier = request.identifier_name();
        info!(
            service = %self.name,
            identifier,
            structured = self.structured,
            "Starting widget generation"
        );

        let prompt = build_prompt(identifier, self.structured, request.prompt());
        let raw = match self.executor.execute(self.remote.as_ref(), &prompt).await {
            Ok(raw) => raw,
            Err(RetryError::Contract(err)) => return Err(err),
            Err(err) => return Ok(self.fall_back(identifier, err.to_string())),
        };

        let (code, aux_structure) = if self.structured {
            match payload::parse(&extract_payload(&raw)) {
                Ok(parsed) => (parsed.code, Some(parsed.aux_structure)),
                Err(failure) => return Ok(self.fall_back(identifier, failure.to_string())),
            }
        } else {
            (raw, None)
        };

        let sanitized = sanitize(&code, identifier);
        if !sanitized.identifier_enforced {
            return Ok(self.fall_back(
                identifier,
                format!("no widget class could be named {}", identifier),
            ));
        }

        self.sink.write(identifier, &sanitized.code);
        info!(
            service = %self.name,
            identifier,
            code_chars = sanitized.code.chars().count(),
            "Widget generation succeeded"
        );
        Ok(
            GenerationResult::succeeded(&self.name, identifier, sanitized.code, aux_structure)
                .with_model(self.model()),
        )
    }

    fn fall_back(&self, identifier: &str, reason: String) -> GenerationResult {
        let artifact = get_fallback(&reason, identifier);
        self.sink.write(identifier, &artifact.code);
        GenerationResult::fell_back(
            &self.name,
            identifier,
            artifact.code,
            Some(artifact.aux_structure),
            reason,
        )
        .with_model(self.model())
    }
}

/// Pipeline for the local corpus.
pub struct RetrievalService {
    retriever: Arc<SimilarityRetriever>,
    top_k: usize,
    similarity_threshold: f32,
    sink: Arc<dyn ArtifactSink>,
}

impl RetrievalService {
    pub fn new(
        retriever: Arc<SimilarityRetriever>,
        top_k: usize,
        similarity_threshold: f32,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            retriever,
            top_k,
            similarity_threshold,
            sink,
        }
    }

    pub fn with_limits(mut self, top_k: usize, similarity_threshold: f32) -> Self {
        self.top_k = top_k;
        self.similarity_threshold = similarity_threshold;
        self
    }

    pub async fn generate(&self, prompt: &str) -> Result<GenerationResult, ApiError> {
        let request = GenerationRequest::new(prompt, TRAINING_MODEL_IDENTIFIER)?;
        let identifier = request.identifier_name();

        let hit = match self
            .retriever
            .retrieve(request.prompt(), self.top_k, self.similarity_threshold)
            .await
        {
            Ok(hit) => hit,
            Err(err) if err.is_contract_violation() => return Err(err),
            Err(err) => {
                warn!(error = %err, "Retrieval failed");
                return Ok(self.fall_back(identifier, err.to_string(), None));
            }
        };
        let Some(hit) = hit else {
            return Ok(self.fall_back(
                identifier,
                format!(
                    "no corpus entry above similarity threshold {}",
                    self.similarity_threshold
                ),
                None,
            ));
        };
        debug!(
            category = %hit.category,
            similarity_score = hit.similarity_score,
            "Corpus hit"
        );

        let (code, enforced) = enforce_identifier(&hit.code, identifier);
        if !enforced {
            warn!(category = %hit.category, "Corpus hit declares no renameable widget");
            return Ok(self.fall_back(
                identifier,
                format!("no widget class could be named {}", identifier),
                Some(hit.similarity_score),
            ));
        }

        self.sink.write(identifier, &code);
        info!(
            similarity_score = hit.similarity_score,
            category = %hit.category,
            "Served widget from corpus"
        );
        let aux_structure = category_structure(&hit.category);
        Ok(
            GenerationResult::succeeded(TRAINING_MODEL_SERVICE, identifier, code, Some(aux_structure))
                .with_model(Some(self.retriever.encoder_model().to_string()))
                .with_similarity_score(Some(hit.similarity_score)),
        )
    }

    fn fall_back(
        &self,
        identifier: &str,
        reason: String,
        similarity_score: Option<f32>,
    ) -> GenerationResult {
        let artifact = get_fallback(&reason, identifier);
        self.sink.write(identifier, &artifact.code);
        GenerationResult::fell_back(
            TRAINING_MODEL_SERVICE,
            identifier,
            artifact.code,
            Some(artifact.aux_structure),
            reason,
        )
        .with_similarity_score(similarity_score)
    }
}

fn category_structure(category: &str) -> AuxStructure {
    let mut map = AuxStructure::new();
    map.insert("category".to_string(), category.into());
    map
}
