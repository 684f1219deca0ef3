//! widgetforge: Flutter widget generation from natural-language prompts
//!
//! A prompt goes either to a hosted model provider, wrapped in a bounded retry loop, or to a
//! local embedding corpus. Whatever comes back is sanitized, renamed to the requested widget
//! class and validated; anything that cannot be salvaged is replaced by a deterministic
//! fallback widget.

pub mod cli;
pub mod config;
pub mod error;
pub mod fallback;
pub mod generation;
pub mod logging;
pub mod payload;
pub mod provider;
pub mod retrieval;
pub mod sanitize;
pub mod sink;
pub mod types;

pub use error::ApiError;
pub use generation::{GenerationService, RetrievalService, RetryConfig, RetryExecutor};
pub use types::{GenerationRequest, GenerationResult};
