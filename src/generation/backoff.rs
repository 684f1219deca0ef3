//! Exponential backoff with jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base delay used for rate-limit backoffs regardless of the configured base.
pub const RATE_LIMIT_BASE_DELAY: f64 = 5.0;

/// Ceiling for rate-limit backoffs.
pub const RATE_LIMIT_MAX_DELAY: f64 = 60.0;

/// Jitter adds 10-30% of the computed delay.
pub const JITTER_MIN: f64 = 1.10;
pub const JITTER_MAX: f64 = 1.30;

/// Class of a retryable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Overloaded,
    RateLimited,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Overloaded => "overloaded",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// Delay in seconds before the next attempt, using the thread-local RNG.
pub fn compute_delay(attempt: u32, base_delay: f64, max_delay: f64, kind: ErrorKind) -> f64 {
    compute_delay_with(&mut rand::thread_rng(), attempt, base_delay, max_delay, kind)
}

/// Delay in seconds before the next attempt.
///
/// `min(base * 2^attempt, max)` scaled by a uniform factor in `[1.10, 1.30]`. Rate-limit
/// failures ignore the supplied base and ceiling in favour of
/// [`RATE_LIMIT_BASE_DELAY`] / [`RATE_LIMIT_MAX_DELAY`].
pub fn compute_delay_with<R: Rng + ?Sized>(
    rng: &mut R,
    attempt: u32,
    base_delay: f64,
    max_delay: f64,
    kind: ErrorKind,
) -> f64 {
    let (base, ceiling) = match kind {
        ErrorKind::RateLimited => (RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_DELAY),
        ErrorKind::Overloaded | ErrorKind::Other => (base_delay, max_delay),
    };
    let factor = rng.gen_range(JITTER_MIN..=JITTER_MAX);
    exponential_delay(attempt, base, ceiling) * factor
}

/// Un-jittered delay: `min(base * 2^attempt, max)`.
pub fn exponential_delay(attempt: u32, base_delay: f64, max_delay: f64) -> f64 {
    // powi saturates to inf for huge exponents; min() then clamps to max_delay.
    let exponent = attempt.min(i32::MAX as u32) as i32;
    (base_delay * 2f64.powi(exponent)).min(max_delay)
}
