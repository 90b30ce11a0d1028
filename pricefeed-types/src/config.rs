//! Configuration types shared across the orchestrator, scheduler and binaries.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::PriceFeedError;

/// Upper bound accepted for `BackfillConfig::backfill_minutes`.
pub const MAX_BACKFILL_MINUTES: u32 = 1000;
/// Smallest non-zero heartbeat interval accepted by [`PriceFeedConfig::validate`].
pub const MIN_HEARTBEAT_INTERVAL_SECS: u64 = 10;
/// Largest buffer delay accepted by [`PriceFeedConfig::validate`].
pub const MAX_HEARTBEAT_BUFFER_SECS: u64 = 30;

/// Settings that steer gap detection and backfill window sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// Minutes of history to keep for each symbol when no explicit value is given.
    pub backfill_minutes: u32,
    /// Whether the startup sweep fills gaps for all active symbols.
    pub gap_fill_enabled: bool,
    /// Gaps at or below this many minutes are treated as continuous history.
    pub gap_fill_threshold_minutes: u32,
    /// Upper bound on the size of a single gap-fill window.
    pub max_gap_fill_minutes: u32,
    /// How many symbols `backfill_all_symbols` processes at once (1 = sequential).
    pub concurrency: usize,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            backfill_minutes: 5,
            gap_fill_enabled: true,
            gap_fill_threshold_minutes: 1,
            max_gap_fill_minutes: 1000,
            concurrency: 1,
        }
    }
}

/// Cadence of the heartbeat scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Seconds between beats. Zero degenerates to a constant `buffer_delay_secs` delay.
    pub interval_secs: u64,
    /// Seconds to wait after each aligned boundary before firing.
    pub buffer_delay_secs: u64,
    /// How long `stop()` waits for an in-flight beat before cancelling it.
    pub stop_timeout: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            buffer_delay_secs: 5,
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Exponential backoff applied around retryable exchange calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first call (>= 1).
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Cap applied to every computed delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Exponential factor applied per attempt (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            factor: 2,
            jitter_percent: 0,
        }
    }
}

/// Global configuration for the `PriceFeed` orchestrator and its scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFeedConfig {
    /// Backfill and gap-fill settings.
    pub backfill: BackfillConfig,
    /// Heartbeat cadence.
    pub heartbeat: HeartbeatConfig,
    /// Retry policy for exchange calls.
    pub retry: RetryConfig,
}

impl PriceFeedConfig {
    /// Check every bound the runtime relies on.
    ///
    /// # Errors
    /// Returns `PriceFeedError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<(), PriceFeedError> {
        let b = &self.backfill;
        if b.backfill_minutes == 0 || b.backfill_minutes > MAX_BACKFILL_MINUTES {
            return Err(PriceFeedError::InvalidConfig(format!(
                "backfill_minutes must be within 1..={MAX_BACKFILL_MINUTES}, got {}",
                b.backfill_minutes
            )));
        }
        if b.max_gap_fill_minutes == 0 {
            return Err(PriceFeedError::InvalidConfig(
                "max_gap_fill_minutes must be at least 1".into(),
            ));
        }
        if b.concurrency == 0 {
            return Err(PriceFeedError::InvalidConfig(
                "backfill concurrency must be at least 1".into(),
            ));
        }

        let h = &self.heartbeat;
        if h.interval_secs != 0 && h.interval_secs < MIN_HEARTBEAT_INTERVAL_SECS {
            return Err(PriceFeedError::InvalidConfig(format!(
                "heartbeat interval must be 0 or at least {MIN_HEARTBEAT_INTERVAL_SECS}s, got {}s",
                h.interval_secs
            )));
        }
        if h.buffer_delay_secs > MAX_HEARTBEAT_BUFFER_SECS {
            return Err(PriceFeedError::InvalidConfig(format!(
                "heartbeat buffer delay must be at most {MAX_HEARTBEAT_BUFFER_SECS}s, got {}s",
                h.buffer_delay_secs
            )));
        }

        let r = &self.retry;
        if r.max_attempts == 0 {
            return Err(PriceFeedError::InvalidConfig(
                "retry max_attempts must be at least 1".into(),
            ));
        }
        if r.factor == 0 {
            return Err(PriceFeedError::InvalidConfig(
                "retry factor must be at least 1".into(),
            ));
        }
        if r.base_delay_ms > r.max_delay_ms {
            return Err(PriceFeedError::InvalidConfig(format!(
                "retry base delay {}ms exceeds cap {}ms",
                r.base_delay_ms, r.max_delay_ms
            )));
        }
        if r.jitter_percent > 100 {
            return Err(PriceFeedError::InvalidConfig(
                "retry jitter_percent must be within 0..=100".into(),
            ));
        }
        Ok(())
    }
}
