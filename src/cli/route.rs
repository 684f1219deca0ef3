//! CLI route: single route table and run context. Dispatches to the services and presentation.

use crate::cli::output::to_json;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_providers_json, format_providers_text, ProviderRow};
use crate::config::{ConfigLoader, ForgeConfig};
use crate::error::ApiError;
use crate::generation::{
    fan_out, FanOutEntry, GenerationService, RetrievalService, RetryExecutor,
};
use crate::provider::{ProviderRegistry, ProviderSession};
use crate::retrieval::{QueryEncoder, SimilarityRetriever};
use crate::sink::{ArtifactSink, DiscardSink, FileArtifactSink};
use crate::types::GenerationRequest;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace, loaded config and provider registry.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ForgeConfig,
    registry: ProviderRegistry,
    sink: Arc<dyn ArtifactSink>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(workspace_root: PathBuf, config: ForgeConfig) -> Result<Self, ApiError> {
        let config = config.validated()?;
        let registry = ProviderRegistry::load_from_config(&config);
        let sink: Arc<dyn ArtifactSink> = if config.output.enabled {
            Arc::new(FileArtifactSink::new(config.output.widgets_dir.clone()))
        } else {
            Arc::new(DiscardSink)
        };
        Ok(Self {
            workspace_root,
            config,
            registry,
            sink,
        })
    }

    pub fn workspace_root(&self) -> &PathBuf {
        &self.workspace_root
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Generate {
                provider,
                identifier,
                prompt,
            } => self.handle_generate(provider, identifier.as_deref(), prompt).await,
            Commands::FanOut { prompt } => self.handle_fan_out(prompt).await,
            Commands::Retrieve {
                top_k,
                threshold,
                prompt,
            } => self.handle_retrieve(*top_k, *threshold, prompt).await,
            Commands::Models { provider } => self.handle_models(provider).await,
            Commands::Providers { format } => Ok(self.handle_providers(*format)),
        }
    }

    fn service_for(&self, provider: &str) -> Result<GenerationService, ApiError> {
        let session = Arc::new(self.registry.create_session(provider)?);
        let executor = RetryExecutor::new(Arc::new(self.config.retry_for(provider)));
        Ok(GenerationService::from_session(
            session,
            executor,
            self.sink.clone(),
        ))
    }

    async fn handle_generate(
        &self,
        provider: &str,
        identifier: Option<&str>,
        prompt: &str,
    ) -> Result<String, ApiError> {
        let service = self.service_for(provider)?;
        let request = match identifier {
            Some(identifier) => GenerationRequest::new(prompt, identifier)?,
            None => service.request(prompt)?,
        };
        service.initialize().await?;
        let result = service.generate(&request).await?;
        info!(
            provider,
            success = result.success,
            identifier = %result.identifier_name,
            "Generate command finished"
        );
        to_json(&result)
    }

    async fn handle_fan_out(&self, prompt: &str) -> Result<String, ApiError> {
        let names = self.config.fan_out_providers();
        if names.is_empty() {
            return Err(ApiError::ProviderNotConfigured(
                "no providers configured for fan-out".to_string(),
            ));
        }

        let mut services = Vec::new();
        let mut failed = Vec::new();
        for name in &names {
            match self.service_for(name) {
                Ok(service) => services.push(service),
                Err(err) => {
                    warn!(provider = %name, error = %err, "Skipping provider");
                    failed.push(FanOutEntry {
                        provider: name.clone(),
                        result: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let mut finished = fan_out(&services, prompt, self.config.fan_out.max_workers)
            .await?
            .into_iter();
        let mut failed = failed.into_iter();
        // Restore configuration order across started and skipped providers.
        let entries: Vec<FanOutEntry> = names
            .iter()
            .filter_map(|name| {
                if services.iter().any(|s| s.name() == name) {
                    finished.next()
                } else {
                    failed.next()
                }
            })
            .collect();

        let succeeded = entries
            .iter()
            .filter(|e| e.result.as_ref().map_or(false, |r| r.success))
            .count();
        to_json(&json!({
            "prompt": prompt,
            "results": entries,
            "total": entries.len(),
            "succeeded": succeeded,
        }))
    }

    async fn handle_retrieve(
        &self,
        top_k: Option<usize>,
        threshold: Option<f32>,
        prompt: &str,
    ) -> Result<String, ApiError> {
        let settings = &self.config.retrieval;
        let corpus_path = settings.corpus_path.as_ref().ok_or_else(|| {
            ApiError::ConfigError("retrieval.corpus_path is not set".to_string())
        })?;

        let encoder: Arc<dyn QueryEncoder> = Arc::from(settings.encoder.build()?);
        let retriever = Arc::new(SimilarityRetriever::new(encoder));
        // A failed load leaves the retriever unusable; retrieve reports why.
        retriever.load(corpus_path);

        let service = RetrievalService::new(
            retriever,
            top_k.unwrap_or(settings.top_k),
            threshold.unwrap_or(settings.similarity_threshold),
            self.sink.clone(),
        );
        let result = service.generate(prompt).await?;
        to_json(&result)
    }

    async fn handle_models(&self, provider: &str) -> Result<String, ApiError> {
        let config = self.registry.get_or_error(provider)?;
        let session: ProviderSession = self.registry.create_session(provider)?;
        let listed = session.list_models().await?;
        let ranked = config.provider_type.catalog().rank_models(listed.clone());
        to_json(&json!({
            "provider": provider,
            "provider_type": config.provider_type,
            "models": listed,
            "candidates": ranked,
        }))
    }

    fn handle_providers(&self, format: OutputFormat) -> String {
        let rows: Vec<ProviderRow> = self
            .registry
            .list_all()
            .into_iter()
            .map(|(name, config)| ProviderRow::from_config(name, config))
            .collect();
        match format {
            OutputFormat::Text => format_providers_text(&rows),
            OutputFormat::Json => format_providers_json(&rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderConfig, ProviderType};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_providers_command_lists_configured() {
        let mut config = ForgeConfig::default();
        config
            .providers
            .insert("local".into(), ProviderConfig::new(ProviderType::Ollama));
        let ctx = RunContext::from_config(PathBuf::from("."), config).unwrap();
        let out = ctx
            .execute(&Commands::Providers {
                format: OutputFormat::Json,
            })
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["providers"][0]["name"], "local");
    }

    #[tokio::test]
    async fn test_generate_unknown_provider_is_error() {
        let ctx = RunContext::from_config(PathBuf::from("."), ForgeConfig::default()).unwrap();
        let err = ctx
            .execute(&Commands::Generate {
                provider: "nope".into(),
                identifier: None,
                prompt: "a card".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ProviderNotConfigured(_)));
    }

    #[tokio::test]
    async fn test_retrieve_with_missing_corpus_reports_not_loaded() {
        let dir = TempDir::new().unwrap();
        let mut config = ForgeConfig::default();
        config.retrieval.corpus_path = Some(dir.path().join("missing.json"));
        config.output.enabled = false;
        let ctx = RunContext::from_config(dir.path().to_path_buf(), config).unwrap();
        let err = ctx
            .execute(&Commands::Retrieve {
                top_k: None,
                threshold: None,
                prompt: "a card".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::RetrieverNotLoaded(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ForgeConfig::default();
        config.fan_out.max_workers = 0;
        assert!(RunContext::from_config(PathBuf::from("."), config).is_err());
    }
}
