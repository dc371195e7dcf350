//! Bounded retry with exponential backoff
//!
//! A [`RetryPolicy`] wraps any fallible async operation. Every failure is
//! retried until the attempt budget is spent; the last failure is then
//! returned to the caller unchanged.
//!
//! # Backoff schedule (defaults: multiplier 1s, clamp 4s..15s)
//!
//! | Failed attempt | Raw wait | Clamped wait |
//! |----------------|----------|--------------|
//! | 1 | 1s | 4s |
//! | 2 | 2s | 4s |
//! | 3 | 4s | 4s |
//! | 4 | 8s | 8s |
//! | 5 | 16s | 15s |

use crate::config::RetryConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry policy: attempt budget plus a jitter-free, capped exponential backoff
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    min_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, min_backoff: Duration, max_backoff: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_backoff,
            max_backoff: max_backoff.max(min_backoff),
            multiplier,
        }
    }

    /// A policy that tries once and never waits
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO, 0.0)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait applied after the given (1-based) attempt fails
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(62) as i32;
        let raw_secs = self.multiplier * 2f64.powi(exponent);
        let raw = if raw_secs.is_finite() && raw_secs >= 0.0 {
            Duration::try_from_secs_f64(raw_secs).unwrap_or(self.max_backoff)
        } else {
            self.max_backoff
        };
        raw.clamp(self.min_backoff, self.max_backoff)
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent
    ///
    /// `label` only appears in log lines.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.max_attempts => {
                    tracing::debug!(
                        "Giving up on {} after {} attempt(s): {}",
                        label,
                        attempt,
                        err
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "{} failed, retrying after backoff",
                        label
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.min_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
            config.multiplier,
        )
    }
}
