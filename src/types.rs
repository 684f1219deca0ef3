//! Core request/response types shared by the generation and retrieval paths.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Auxiliary UI description that accompanies generated code.
pub type AuxStructure = Map<String, Value>;

/// One incoming generation call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    identifier_name: String,
}

impl GenerationRequest {
    /// Build a request; the prompt must contain something other than whitespace and the
    /// identifier must be a valid Dart type name.
    pub fn new(
        prompt: impl Into<String>,
        identifier_name: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let prompt = prompt.into();
        let identifier_name = identifier_name.into();

        if prompt.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "Prompt cannot be empty".to_string(),
            ));
        }
        if !is_type_identifier(&identifier_name) {
            return Err(ApiError::InvalidRequest(format!(
                "Invalid widget identifier: {:?}",
                identifier_name
            )));
        }

        Ok(Self {
            prompt,
            identifier_name,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn identifier_name(&self) -> &str {
        &self.identifier_name
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_type_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Caller-facing result envelope.
///
/// `code` is never empty: a failed run carries the fallback artifact, `success == false`
/// and a populated `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub code: String,
    pub success: bool,
    pub error: Option<String>,
    pub identifier_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_structure: Option<AuxStructure>,
    /// Provider (or `training_model`) that produced the result.
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
}

impl GenerationResult {
    pub fn succeeded(
        service: impl Into<String>,
        identifier_name: impl Into<String>,
        code: String,
        aux_structure: Option<AuxStructure>,
    ) -> Self {
        Self {
            code,
            success: true,
            error: None,
            identifier_name: identifier_name.into(),
            aux_structure,
            service: service.into(),
            model: None,
            similarity_score: None,
        }
    }

    pub fn fell_back(
        service: impl Into<String>,
        identifier_name: impl Into<String>,
        code: String,
        aux_structure: Option<AuxStructure>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            code,
            success: false,
            error: Some(error.into()),
            identifier_name: identifier_name.into(),
            aux_structure,
            service: service.into(),
            model: None,
            similarity_score: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_similarity_score(mut self, score: Option<f32>) -> Self {
        self.similarity_score = score;
        self
    }
}
