//! Artifact sink: persists generated widgets as `.dart` files.

use crate::error::StorageError;
use crate::types::is_type_identifier;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Destination for generated code. Failures are reported, never raised.
pub trait ArtifactSink: Send + Sync {
    /// Persist `code` under `identifier`; `true` when the artifact was written and verified.
    fn write(&self, identifier: &str, code: &str) -> bool;
}

/// Output options, `[output]` in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_widgets_dir")]
    pub widgets_dir: PathBuf,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_widgets_dir() -> PathBuf {
    PathBuf::from("lib/widgets")
}

fn default_enabled() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            widgets_dir: default_widgets_dir(),
            enabled: default_enabled(),
        }
    }
}

/// Writes `<widgets_dir>/<snake_case(identifier)>.dart`.
#[derive(Debug, Clone)]
pub struct FileArtifactSink {
    widgets_dir: PathBuf,
}

impl FileArtifactSink {
    pub fn new(widgets_dir: impl Into<PathBuf>) -> Self {
        Self {
            widgets_dir: widgets_dir.into(),
        }
    }

    pub fn widgets_dir(&self) -> &Path {
        &self.widgets_dir
    }

    pub fn path_for(&self, identifier: &str) -> Result<PathBuf, StorageError> {
        if !is_type_identifier(identifier) {
            return Err(StorageError::InvalidPath(format!(
                "Identifier {:?} cannot be used as a file name",
                identifier
            )));
        }
        Ok(self
            .widgets_dir
            .join(format!("{}.dart", snake_case(identifier))))
    }

    /// Write and read back. Returns the file path.
    pub fn try_write(&self, identifier: &str, code: &str) -> Result<PathBuf, StorageError> {
        let path = self.path_for(identifier)?;
        fs::create_dir_all(&self.widgets_dir)?;
        fs::write(&path, code)?;

        let written = fs::read_to_string(&path)?;
        if written != code {
            return Err(StorageError::InvalidPath(format!(
                "Read-back mismatch for {}",
                path.display()
            )));
        }
        Ok(path)
    }
}

impl ArtifactSink for FileArtifactSink {
    fn write(&self, identifier: &str, code: &str) -> bool {
        match self.try_write(identifier, code) {
            Ok(path) => {
                info!(path = %path.display(), bytes = code.len(), "Wrote widget artifact");
                true
            }
            Err(err) => {
                warn!(identifier, error = %err, "Failed to write widget artifact");
                false
            }
        }
    }
}

/// Sink used when output is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl ArtifactSink for DiscardSink {
    fn write(&self, _identifier: &str, _code: &str) -> bool {
        true
    }
}

/// `ChatGPTGeneratedWidget` -> `chat_gpt_generated_widget`.
pub fn snake_case(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut out = String::with_capacity(identifier.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("GroqGeneratedWidget"), "groq_generated_widget");
        assert_eq!(snake_case("ChatGPTGeneratedWidget"), "chat_gpt_generated_widget");
        assert_eq!(snake_case("HuggingFaceGeneratedWidget"), "hugging_face_generated_widget");
        assert_eq!(snake_case("Bar"), "bar");
        assert_eq!(snake_case("_Private2Widget"), "_private2_widget");
    }

    #[test]
    fn test_write_creates_directory_and_verifies() {
        let dir = TempDir::new().unwrap();
        let sink = FileArtifactSink::new(dir.path().join("lib").join("widgets"));
        assert!(sink.write("GroqGeneratedWidget", "class GroqGeneratedWidget {}"));

        let path = dir.path().join("lib/widgets/groq_generated_widget.dart");
        assert_eq!(fs::read_to_string(path).unwrap(), "class GroqGeneratedWidget {}");
    }

    #[test]
    fn test_write_failure_returns_false() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();
        let sink = FileArtifactSink::new(&blocker);
        assert!(!sink.write("Bar", "class Bar {}"));
    }

    #[test]
    fn test_rejects_path_like_identifiers() {
        let sink = FileArtifactSink::new("out");
        assert!(matches!(
            sink.path_for("../escape"),
            Err(StorageError::InvalidPath(_))
        ));
    }
}
