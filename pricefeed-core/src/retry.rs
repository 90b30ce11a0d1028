//! Data-driven retry policy for exchange calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::PriceFeedError;
use pricefeed_types::RetryConfig;

/// Add up to `jitter_percent` of `base_ms` as random jitter.
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    if jitter_percent == 0 || base_ms == 0 {
        return base_ms;
    }
    let jitter_range = std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100);
    let mut rng = rand::rng();
    base_ms + rng.random_range(0..jitter_range)
}

/// Exponential backoff policy applied around a fallible async operation.
///
/// Behavior and trade-offs:
/// - Only errors for which [`PriceFeedError::is_retryable`] is true are retried;
///   everything else is returned on the first failure.
/// - After the attempt budget is spent the last error is returned unchanged,
///   so callers see the exchange's own classification.
/// - Delays grow as `base * factor^n`, capped at `max_delay_ms`, plus optional
///   jitter; sleeping uses `tokio::time`, so paused-clock tests stay instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    cfg: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build a policy from its configuration.
    #[must_use]
    pub const fn new(cfg: RetryConfig) -> Self {
        Self { cfg }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            cfg: RetryConfig {
                max_attempts: 1,
                base_delay_ms: 0,
                max_delay_ms: 0,
                factor: 1,
                jitter_percent: 0,
            },
        }
    }

    /// Underlying configuration.
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.cfg
    }

    /// Delay before retry number `retry` (0 = the wait after the first failure), without jitter.
    #[must_use]
    pub fn base_delay_for(&self, retry: u32) -> Duration {
        let factor = u64::from(self.cfg.factor.max(1));
        let mut ms = self.cfg.base_delay_ms;
        for _ in 0..retry {
            ms = ms.saturating_mul(factor);
            if ms >= self.cfg.max_delay_ms {
                break;
            }
        }
        Duration::from_millis(ms.min(self.cfg.max_delay_ms))
    }

    /// Delay before retry number `retry`, including jitter.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = u64::try_from(self.base_delay_for(retry).as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(jitter_wait(base, u32::from(self.cfg.jitter_percent)))
    }

    /// Run `op` until it succeeds, fails permanently, or the attempt budget is spent.
    ///
    /// `label` names the operation in retry logs.
    ///
    /// # Errors
    /// Returns the first non-retryable error, or the last retryable error once
    /// `max_attempts` calls have failed.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, PriceFeedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PriceFeedError>>,
    {
        let attempts = self.cfg.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let wait = self.delay_for(attempt - 1);
                    tracing::warn!(
                        op = label,
                        attempt,
                        max_attempts = attempts,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "retrying after transient error"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
