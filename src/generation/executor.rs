//! Retry executor
//!
//! Drives a bounded sequence of attempts against a [`RemoteCall`], classifying each
//! outcome and sleeping with [`backoff`](super::backoff) between failures. Remote failures
//! are absorbed into [`RetryError::Exhausted`]; only a call against an uninitialized
//! capability escapes as [`RetryError::Contract`], without consuming an attempt.

use super::backoff::{self, ErrorKind};
use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Message recorded when the last attempt returned blank text.
pub const EMPTY_RESPONSE: &str = "empty response";

/// Message recorded when a cancellation signal interrupts a backoff sleep.
pub const CANCELLED: &str = "cancelled";

/// Retry settings, shared read-only by every call made through one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Seconds
    #[serde(default = "default_base_delay")]
    pub base_delay: f64,

    /// Seconds
    #[serde(default = "default_max_delay")]
    pub max_delay: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> f64 {
    1.0
}

fn default_max_delay() -> f64 {
    30.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if !(self.base_delay.is_finite() && self.base_delay > 0.0) {
            return Err(format!("base_delay must be positive (got {})", self.base_delay));
        }
        if !(self.max_delay.is_finite() && self.max_delay >= self.base_delay) {
            return Err(format!(
                "max_delay must be >= base_delay (got {} < {})",
                self.max_delay, self.base_delay
            ));
        }
        Ok(())
    }
}

/// Classified result of a single attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(String),
    EmptyResponse,
    TransientError { kind: ErrorKind, message: String },
    /// Stops the loop without another attempt. [`AttemptOutcome::classify`] never yields it:
    /// every raised fault is transient.
    FatalError { message: String },
}

impl AttemptOutcome {
    /// Classify what the remote call returned.
    ///
    /// Contract violations are handed back as `Err` so the executor can propagate them.
    pub fn classify(result: Result<String, ApiError>) -> Result<Self, ApiError> {
        match result {
            Ok(text) if text.trim().is_empty() => Ok(AttemptOutcome::EmptyResponse),
            Ok(text) => Ok(AttemptOutcome::Success(text)),
            Err(err) if err.is_contract_violation() => Err(err),
            Err(err) => {
                let message = err.to_string();
                Ok(AttemptOutcome::TransientError {
                    kind: classify_message(&message),
                    message,
                })
            }
        }
    }
}

/// Substring classification of a raised fault.
pub fn classify_message(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    if lowered.contains("503") || lowered.contains("overloaded") {
        ErrorKind::Overloaded
    } else if lowered.contains("429") || lowered.contains("quota") {
        ErrorKind::RateLimited
    } else {
        ErrorKind::Other
    }
}

/// Remote model call capability.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    /// Send one prompt and return the raw response text.
    async fn call(&self, prompt: &str) -> Result<String, ApiError>;
}

/// Suspension between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("Failed to get response after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error(transparent)]
    Contract(ApiError),
}

/// Bounded retry loop over a remote call.
#[derive(Clone)]
pub struct RetryExecutor {
    config: Arc<RetryConfig>,
    sleeper: Arc<dyn Sleeper>,
    cancel: Option<watch::Receiver<bool>>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("config", &self.config)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

impl RetryExecutor {
    pub fn new(config: Arc<RetryConfig>) -> Self {
        Self {
            config,
            sleeper: Arc::new(TokioSleeper),
            cancel: None,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Backoff sleeps end early once the receiver observes `true`.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run up to `max_attempts` calls; the first non-blank response wins.
    pub async fn execute(&self, remote: &dyn RemoteCall, prompt: &str) -> Result<String, RetryError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = EMPTY_RESPONSE.to_string();

        info!(
            max_attempts,
            prompt_chars = prompt.chars().count(),
            "Starting remote call with retry"
        );

        for attempt in 0..max_attempts {
            debug!(attempt = attempt + 1, max_attempts, "Sending request");

            let outcome = AttemptOutcome::classify(remote.call(prompt).await).map_err(|err| {
                error!(error = %err, "Remote call rejected before any attempt was made");
                RetryError::Contract(err)
            })?;

            let kind = match outcome {
                AttemptOutcome::Success(text) => {
                    info!(
                        attempt = attempt + 1,
                        response_chars = text.chars().count(),
                        "Received response"
                    );
                    return Ok(text);
                }
                AttemptOutcome::EmptyResponse => {
                    warn!(attempt = attempt + 1, "Empty response");
                    last_error = EMPTY_RESPONSE.to_string();
                    ErrorKind::Other
                }
                AttemptOutcome::TransientError { kind, message } => {
                    warn!(attempt = attempt + 1, error_kind = %kind, error = %message, "Attempt failed");
                    last_error = message;
                    kind
                }
                AttemptOutcome::FatalError { message } => {
                    error!(attempt = attempt + 1, error = %message, "Non-retryable failure");
                    return Err(RetryError::Exhausted {
                        attempts: attempt + 1,
                        last_error: message,
                    });
                }
            };

            if attempt + 1 < max_attempts {
                let seconds = backoff::compute_delay(
                    attempt,
                    self.config.base_delay,
                    self.config.max_delay,
                    kind,
                );
                info!(
                    attempt = attempt + 1,
                    error_kind = %kind,
                    delay_secs = seconds,
                    "Backing off before retry"
                );
                let delay = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX);
                if !self.pause(delay).await {
                    warn!(attempt = attempt + 1, "Retry loop cancelled during backoff");
                    return Err(RetryError::Exhausted {
                        attempts: attempt + 1,
                        last_error: CANCELLED.to_string(),
                    });
                }
            }
        }

        error!(max_attempts, last_error = %last_error, "All retry attempts failed");
        Err(RetryError::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    /// Returns false when the sleep was interrupted by cancellation.
    async fn pause(&self, delay: Duration) -> bool {
        let Some(cancel) = &self.cancel else {
            self.sleeper.sleep(delay).await;
            return true;
        };

        let mut cancel = cancel.clone();
        let already_cancelled = *cancel.borrow();
        if already_cancelled {
            return false;
        }

        tokio::select! {
            _ = self.sleeper.sleep(delay) => true,
            _ = wait_for_cancel(&mut cancel) => false,
        }
    }
}

async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if cancel.changed().await.is_err() {
            // Sender dropped: cancellation can no longer arrive.
            std::future::pending::<()>().await;
        }
        let cancelled = *cancel.borrow();
        if cancelled {
            return;
        }
    }
}
