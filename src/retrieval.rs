//! Nearest-neighbour retrieval over a precomputed embedding corpus.

pub mod corpus;
pub mod encoder;

pub use corpus::{Corpus, CorpusEntry};
pub use encoder::{EncoderConfig, HashingEncoder, HttpEncoder, QueryEncoder};

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

/// Best corpus hit for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub prompt: String,
    pub code: String,
    pub category: String,
    /// Cosine similarity in `[-1, 1]`.
    pub similarity_score: f32,
}

/// Retrieval options, `[retrieval]` in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub similarity_threshold: f32,
    #[serde(default)]
    pub encoder: EncoderConfig,
}

fn default_top_k() -> usize {
    1
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            corpus_path: None,
            top_k: default_top_k(),
            similarity_threshold: 0.0,
            encoder: EncoderConfig::default(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.similarity_threshold.is_finite() {
            return Err("similarity_threshold must be a finite number".to_string());
        }
        self.encoder.validate()
    }
}

enum LoadState {
    Loaded(Corpus),
    Failed(String),
}

/// Loads a corpus once and answers similarity queries against it.
///
/// The first `load` decides the retriever's fate for the rest of the process: a failed
/// load is never retried.
pub struct SimilarityRetriever {
    encoder: Arc<dyn QueryEncoder>,
    state: OnceLock<LoadState>,
}

impl SimilarityRetriever {
    pub fn new(encoder: Arc<dyn QueryEncoder>) -> Self {
        Self {
            encoder,
            state: OnceLock::new(),
        }
    }

    /// Load the corpus at `path`. Returns whether the retriever is usable.
    pub fn load(&self, path: &Path) -> bool {
        let state = self.state.get_or_init(|| match Corpus::from_path(path) {
            Ok(corpus) => {
                info!(
                    path = %path.display(),
                    entries = corpus.len(),
                    dimension = corpus.dimension(),
                    "Loaded retrieval corpus"
                );
                self.check_encoder(&corpus);
                LoadState::Loaded(corpus)
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "Failed to load retrieval corpus");
                LoadState::Failed(err.to_string())
            }
        });
        matches!(state, LoadState::Loaded(_))
    }

    /// Install an in-memory corpus. Same once-only semantics as [`Self::load`].
    pub fn load_corpus(&self, corpus: Corpus) -> bool {
        let state = self.state.get_or_init(|| {
            self.check_encoder(&corpus);
            LoadState::Loaded(corpus)
        });
        matches!(state, LoadState::Loaded(_))
    }

    fn check_encoder(&self, corpus: &Corpus) {
        if let Some(corpus_model) = corpus.model_name() {
            if corpus_model != self.encoder.model_name() {
                warn!(
                    corpus_model,
                    encoder_model = self.encoder.model_name(),
                    "Corpus was built with a different encoder; scores may be meaningless"
                );
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state.get(), Some(LoadState::Loaded(_)))
    }

    pub fn corpus(&self) -> Option<&Corpus> {
        match self.state.get() {
            Some(LoadState::Loaded(corpus)) => Some(corpus),
            _ => None,
        }
    }

    pub fn encoder_model(&self) -> &str {
        self.encoder.model_name()
    }

    /// Best hit among the `top_k` most similar entries, if it clears `similarity_threshold`.
    ///
    /// Ties keep corpus order. Querying before a successful load is an error.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        similarity_threshold: f32,
    ) -> Result<Option<RetrievalResult>, ApiError> {
        let corpus = match self.state.get() {
            Some(LoadState::Loaded(corpus)) => corpus,
            Some(LoadState::Failed(reason)) => {
                return Err(ApiError::RetrieverNotLoaded(format!(
                    "corpus failed to load: {}",
                    reason
                )))
            }
            None => {
                return Err(ApiError::RetrieverNotLoaded(
                    "retrieve called before load".to_string(),
                ))
            }
        };
        if top_k == 0 {
            return Ok(None);
        }

        let query_embedding = self.encoder.encode(query).await?;
        if query_embedding.len() != corpus.dimension() {
            return Err(ApiError::CorpusError(format!(
                "Query embedding has dimension {}, corpus expects {}",
                query_embedding.len(),
                corpus.dimension()
            )));
        }

        let ranked = rank(corpus.entries(), &query_embedding, top_k);
        let Some(&(index, score)) = ranked.first() else {
            return Ok(None);
        };
        debug!(
            best_index = index,
            similarity_score = score,
            similarity_threshold,
            candidates = ranked.len(),
            "Ranked corpus entries"
        );
        if score < similarity_threshold {
            return Ok(None);
        }

        let entry = &corpus.entries()[index];
        Ok(Some(RetrievalResult {
            prompt: entry.prompt.clone(),
            code: entry.code.clone(),
            category: entry.category.clone(),
            similarity_score: score,
        }))
    }
}

/// Indices and scores of the `top_k` best entries, best first.
fn rank(entries: &[CorpusEntry], query: &[f32], top_k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| (index, cosine_similarity(query, &entry.embedding)))
        .collect();
    // Stable sort: equal scores stay in corpus order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_k.min(entries.len()));
    scored
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0f64, 0f64, 0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(prompt: &str, embedding: Vec<f32>) -> CorpusEntry {
        CorpusEntry {
            prompt: prompt.to_string(),
            code: format!("// {}", prompt),
            category: "test".to_string(),
            embedding,
        }
    }

    fn hashing_retriever(dimension: usize, prompts: &[&str]) -> SimilarityRetriever {
        let encoder = HashingEncoder::new(dimension).unwrap();
        let entries = prompts
            .iter()
            .map(|p| entry(p, encoder.embed(p)))
            .collect();
        let corpus = Corpus::from_entries(Some(encoder.model_name().to_string()), entries).unwrap();
        let retriever = SimilarityRetriever::new(Arc::new(encoder));
        assert!(retriever.load_corpus(corpus));
        retriever
    }

    #[test]
    fn test_cosine_bounds() {
        assert_eq!(cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_identical_embedding_scores_one() {
        let retriever = hashing_retriever(128, &["login form", "settings page"]);
        let hit = retriever.retrieve("login form", 1, 0.0).await.unwrap().unwrap();
        assert_eq!(hit.prompt, "login form");
        assert_eq!(hit.similarity_score, 1.0);
    }

    #[tokio::test]
    async fn test_threshold_above_one_never_matches() {
        let retriever = hashing_retriever(128, &["login form"]);
        assert!(retriever.retrieve("login form", 1, 1.01).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let encoder = HashingEncoder::new(8).unwrap();
        let same = encoder.embed("card");
        let corpus = Corpus::from_entries(
            None,
            vec![entry("first", same.clone()), entry("second", same)],
        )
        .unwrap();
        let retriever = SimilarityRetriever::new(Arc::new(encoder));
        retriever.load_corpus(corpus);
        let hit = retriever.retrieve("card", 5, 0.0).await.unwrap().unwrap();
        assert_eq!(hit.prompt, "first");
    }

    #[tokio::test]
    async fn test_zero_top_k_returns_none() {
        let retriever = hashing_retriever(16, &["a"]);
        assert!(retriever.retrieve("a", 0, -1.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retrieve_before_load_is_contract_violation() {
        let retriever = SimilarityRetriever::new(Arc::new(HashingEncoder::new(8).unwrap()));
        let err = retriever.retrieve("x", 1, 0.0).await.unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[tokio::test]
    async fn test_failed_load_is_permanent() {
        let dir = tempfile::TempDir::new().unwrap();
        let retriever = SimilarityRetriever::new(Arc::new(HashingEncoder::new(8).unwrap()));
        assert!(!retriever.load(&dir.path().join("missing.json")));

        let encoder = HashingEncoder::new(8).unwrap();
        let corpus = Corpus::from_entries(None, vec![entry("a", encoder.embed("a"))]).unwrap();
        assert!(!retriever.load_corpus(corpus));
        assert!(!retriever.is_loaded());
        let err = retriever.retrieve("a", 1, 0.0).await.unwrap_err();
        assert!(matches!(err, ApiError::RetrieverNotLoaded(ref msg) if msg.contains("failed to load")));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_error() {
        let corpus = Corpus::from_entries(None, vec![entry("a", vec![1.0, 0.0])]).unwrap();
        let retriever = SimilarityRetriever::new(Arc::new(HashingEncoder::new(4).unwrap()));
        retriever.load_corpus(corpus);
        let err = retriever.retrieve("a", 1, 0.0).await.unwrap_err();
        assert!(!err.is_contract_violation());
    }
}
