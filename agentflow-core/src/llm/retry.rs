//! Bounded retry for transient model failures
//!
//! Exponential backoff with optional jitter. Only errors for which
//! [`crate::AgentflowError::is_retryable`] holds are retried; decode failures and
//! precondition violations surface on the first attempt.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: usize,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Multiplier applied per attempt
    pub backoff_multiplier: f64,
    /// Add up to 25% random jitter to each delay
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// A single attempt, never retried
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    pub fn with_jitter(mut self, add_jitter: bool) -> Self {
        self.add_jitter = add_jitter;
        self
    }

    /// Delay to wait after the given failed attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt.min(i32::MAX as usize) as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let millis = if self.add_jitter {
            capped + capped * 0.25 * jitter_fraction()
        } else {
            capped
        };

        Duration::from_millis(millis as u64)
    }
}

const MANTISSA_BITS: u32 = 53;

/// Uniform value in [0.0, 1.0) taken from a v4 UUID's random bits.
///
/// The low word's top two bits hold the variant; its low 53 bits are random.
fn jitter_fraction() -> f64 {
    let (_, low) = uuid::Uuid::new_v4().as_u64_pair();
    let bits = low & ((1u64 << MANTISSA_BITS) - 1);
    bits as f64 / (1u64 << MANTISSA_BITS) as f64
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget is spent. The last error is returned unchanged.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= max_attempts || !err.is_retryable() {
                    return Err(err);
                }

                let delay = config.delay_for_attempt(attempt - 1);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient model failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
