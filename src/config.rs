//! Configuration System
//!
//! Layered configuration built with the `config` crate. Sources, lowest precedence first:
//! built-in defaults, the user-level file, the workspace files, then `WIDGETFORGE__*`
//! environment variables.

use crate::error::ApiError;
use crate::generation::{FanOutSettings, RetryConfig};
use crate::logging::LoggingConfig;
use crate::retrieval::RetrievalConfig;
use crate::sink::OutputConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use crate::provider::{ProviderConfig, ProviderType};

mod merge {
    pub mod merge_policy;
}

mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod workspace_file;
}

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Provider configurations by name
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Retry policy shared by providers without their own
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub fan_out: FanOutSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String, String),
    Retry(String),
    Retrieval(String),
    Output(String),
    FanOut(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Retry(msg) => write!(f, "Retry: {}", msg),
            ValidationError::Retrieval(msg) => write!(f, "Retrieval: {}", msg),
            ValidationError::Output(msg) => write!(f, "Output: {}", msg),
            ValidationError::FanOut(msg) => write!(f, "Fan-out: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ForgeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, provider) in &self.providers {
            if let Err(e) = provider.validate() {
                errors.push(ValidationError::Provider(name.clone(), e));
            }
        }

        if let Err(e) = self.retry.validate() {
            errors.push(ValidationError::Retry(e));
        }

        if let Err(e) = self.retrieval.validate() {
            errors.push(ValidationError::Retrieval(e));
        }

        if self.output.widgets_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Output(
                "widgets_dir cannot be empty".to_string(),
            ));
        }

        if self.fan_out.max_workers == 0 {
            errors.push(ValidationError::FanOut(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if let Some(order) = &self.fan_out.providers {
            for name in order {
                if !self.providers.contains_key(name) {
                    errors.push(ValidationError::FanOut(format!(
                        "unknown provider '{}'",
                        name
                    )));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one error.
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }

    /// Retry policy for `provider`: its own table when present, else the global one.
    pub fn retry_for(&self, provider: &str) -> RetryConfig {
        self.providers
            .get(provider)
            .and_then(|p| p.retry.clone())
            .unwrap_or_else(|| self.retry.clone())
    }

    /// Providers in fan-out order.
    pub fn fan_out_providers(&self) -> Vec<String> {
        match &self.fan_out.providers {
            Some(order) => order.clone(),
            None => self.providers.keys().cloned().collect(),
        }
    }

    /// Resolve relative paths against the workspace root.
    pub fn resolve_paths(mut self, workspace_root: &Path) -> Self {
        if self.output.widgets_dir.is_relative() {
            self.output.widgets_dir = workspace_root.join(&self.output.widgets_dir);
        }
        if let Some(corpus) = &self.retrieval.corpus_path {
            if corpus.is_relative() {
                self.retrieval.corpus_path = Some(workspace_root.join(corpus));
            }
        }
        self
    }
}

/// Loads [`ForgeConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace: defaults, global file, workspace files, environment.
    pub fn load(workspace_root: &Path) -> Result<ForgeConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder);
        let config: ForgeConfig = builder.build()?.try_deserialize()?;
        Ok(config.resolve_paths(workspace_root))
    }

    /// Load configuration from a single file on top of the defaults, skipping other layers.
    pub fn load_from_file(path: &Path) -> Result<ForgeConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config: ForgeConfig = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()))
            .build()?
            .try_deserialize()?;
        let base = path
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config.resolve_paths(&base))
    }

    /// Path to the user-level config file, if a home directory is known.
    pub fn global_config_path() -> Option<PathBuf> {
        global_config_path()
    }
}
