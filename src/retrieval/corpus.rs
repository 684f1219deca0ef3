//! Precomputed retrieval corpus.
//!
//! On disk the corpus is a single JSON document:
//!
//! ```json
//! {
//!   "model_name": "hashing-256",
//!   "train_data": [{"prompt": "...", "flutter_code": "...", "category": "forms"}],
//!   "train_embeddings": [[0.1, 0.2, ...]]
//! }
//! ```

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const UNKNOWN_CATEGORY: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub prompt: String,
    pub code: String,
    pub category: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Deserialize, Serialize)]
struct CorpusFile {
    #[serde(default)]
    model_name: Option<String>,
    train_data: Vec<TrainRow>,
    train_embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize, Serialize)]
struct TrainRow {
    prompt: String,
    flutter_code: String,
    #[serde(default)]
    category: Option<String>,
}

/// Validated, read-only corpus.
#[derive(Debug, Clone)]
pub struct Corpus {
    model_name: Option<String>,
    dimension: usize,
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    /// Build from entries; every embedding must share one non-zero dimension.
    pub fn from_entries(
        model_name: Option<String>,
        entries: Vec<CorpusEntry>,
    ) -> Result<Self, ApiError> {
        let dimension = entries
            .first()
            .map(|entry| entry.embedding.len())
            .ok_or_else(|| ApiError::CorpusError("Corpus has no entries".to_string()))?;
        if dimension == 0 {
            return Err(ApiError::CorpusError(
                "Corpus embeddings are empty".to_string(),
            ));
        }
        if let Some((index, entry)) = entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.embedding.len() != dimension)
        {
            return Err(ApiError::CorpusError(format!(
                "Embedding {} has dimension {}, expected {}",
                index,
                entry.embedding.len(),
                dimension
            )));
        }
        Ok(Self {
            model_name,
            dimension,
            entries,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, ApiError> {
        let file: CorpusFile = serde_json::from_str(text)
            .map_err(|e| ApiError::CorpusError(format!("Failed to parse corpus: {}", e)))?;

        if file.train_data.len() != file.train_embeddings.len() {
            return Err(ApiError::CorpusError(format!(
                "Corpus has {} entries but {} embeddings",
                file.train_data.len(),
                file.train_embeddings.len()
            )));
        }

        let entries = file
            .train_data
            .into_iter()
            .zip(file.train_embeddings)
            .map(|(row, embedding)| CorpusEntry {
                prompt: row.prompt,
                code: row.flutter_code,
                category: row
                    .category
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
                embedding,
            })
            .collect();

        Self::from_entries(file.model_name, entries)
    }

    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ApiError::CorpusError(format!("Failed to read corpus {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    /// Serialize back into the on-disk layout.
    pub fn to_json_string(&self) -> Result<String, ApiError> {
        let file = CorpusFile {
            model_name: self.model_name.clone(),
            train_data: self
                .entries
                .iter()
                .map(|entry| TrainRow {
                    prompt: entry.prompt.clone(),
                    flutter_code: entry.code.clone(),
                    category: Some(entry.category.clone()),
                })
                .collect(),
            train_embeddings: self
                .entries
                .iter()
                .map(|entry| entry.embedding.clone())
                .collect(),
        };
        serde_json::to_string_pretty(&file)
            .map_err(|e| ApiError::CorpusError(format!("Failed to serialize corpus: {}", e)))
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
