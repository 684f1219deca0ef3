//! Shared stubs for integration tests: scripted remote calls, instant sleeps and an in-memory sink.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use widgetforge::generation::{RemoteCall, Sleeper};
use widgetforge::sink::ArtifactSink;
use widgetforge::ApiError;

/// Remote call that answers every prompt the same way.
pub enum StubRemote {
    Reply(String),
    Overloaded,
    RateLimited,
}

#[async_trait]
impl RemoteCall for StubRemote {
    async fn call(&self, _prompt: &str) -> Result<String, ApiError> {
        match self {
            StubRemote::Reply(text) => Ok(text.clone()),
            StubRemote::Overloaded => Err(ApiError::ProviderOverloaded("overloaded".into())),
            StubRemote::RateLimited => Err(ApiError::ProviderRateLimit("quota exceeded".into())),
        }
    }
}

/// Records delays instead of sleeping.
#[derive(Default)]
pub struct InstantSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().push(delay);
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub writes: Mutex<Vec<(String, String)>>,
}

impl ArtifactSink for MemorySink {
    fn write(&self, identifier: &str, code: &str) -> bool {
        self.writes
            .lock()
            .push((identifier.to_string(), code.to_string()));
        true
    }
}

/// Sink whose writes always fail.
pub struct BrokenSink;

impl ArtifactSink for BrokenSink {
    fn write(&self, _identifier: &str, _code: &str) -> bool {
        false
    }
}
