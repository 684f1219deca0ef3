pub mod backoff;
pub mod executor;
pub mod fanout;
pub mod prompt;
pub mod service;

pub use backoff::ErrorKind;
pub use executor::{
    AttemptOutcome, RemoteCall, RetryConfig, RetryError, RetryExecutor, Sleeper, TokioSleeper,
};
pub use fanout::{fan_out, FanOutEntry, FanOutSettings};
pub use service::{GenerationService, RetrievalService, TRAINING_MODEL_IDENTIFIER};
