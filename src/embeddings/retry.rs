//! Retry policy for remote embedding calls

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::EmbeddingsConfig;
use crate::errors::Result;

/// Exponential backoff retry schedule.
///
/// The wait after failed attempt `n` (1-based) is
/// `multiplier * 2^(n-1)` seconds, clamped to `[min_delay, max_delay]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub multiplier: f64,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &EmbeddingsConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            multiplier: config.backoff_multiplier,
            min_delay: Duration::from_secs(config.backoff_min_secs),
            max_delay: Duration::from_secs(config.backoff_max_secs),
        }
    }

    /// A policy that makes a single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.multiplier * 2f64.powi(exponent);
        let delay = if secs.is_finite() && secs >= 0.0 {
            Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
        } else {
            self.max_delay
        };
        delay.clamp(self.min_delay, self.max_delay.max(self.min_delay))
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// Only errors reporting `is_transient()` are retried; the last error is returned as-is.
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        "Attempt {}/{}: {} failed: {}, retrying in {:?}",
                        attempt, self.max_attempts, operation_name, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: 1.0,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}
