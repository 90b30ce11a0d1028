//! Report envelopes produced by the orchestrator and scheduler.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PriceFeedError;
use crate::market::SymbolId;

/// Named decision taken by the gap-fill planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// No stored data: fetch the full desired window.
    FullBackfill,
    /// Stored history already covers the desired window.
    NoAction,
    /// History is continuous but too short: refetch the desired window.
    ExtendBackward,
    /// Fill the gap after the newest stored point.
    GapOnly,
    /// `GapOnly`, truncated to the maximum gap-fill size.
    GapOnlyLimited,
    /// Gap plus too little history: refetch the desired window.
    GapPlusExtend,
    /// `GapPlusExtend`, truncated to the maximum gap-fill size.
    GapPlusExtendLimited,
}

impl Strategy {
    /// Stable label used in logs and API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullBackfill => "full_backfill",
            Self::NoAction => "no_action",
            Self::ExtendBackward => "extend_backward",
            Self::GapOnly => "gap_only",
            Self::GapOnlyLimited => "gap_only_limited",
            Self::GapPlusExtend => "gap_plus_extend",
            Self::GapPlusExtendLimited => "gap_plus_extend_limited",
        }
    }

    /// The `_limited` counterpart of a gap strategy; other strategies are returned unchanged.
    #[must_use]
    pub const fn limited(self) -> Self {
        match self {
            Self::GapOnly => Self::GapOnlyLimited,
            Self::GapPlusExtend => Self::GapPlusExtendLimited,
            other => other,
        }
    }

    /// Whether the window was clamped by the maximum gap-fill size.
    #[must_use]
    pub const fn is_limited(self) -> bool {
        matches!(self, Self::GapOnlyLimited | Self::GapPlusExtendLimited)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome class of a single-symbol backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillStatus {
    /// Candles were fetched and stored.
    Success,
    /// The planner decided no fetch was needed.
    NoAction,
    /// The exchange returned no candles for the window.
    NoData,
    /// The backfill failed; see `BackfillReport::error`.
    Error,
}

/// Structured result of backfilling one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    /// Exchange pair that was processed.
    pub symbol: String,
    /// Outcome class.
    pub status: BackfillStatus,
    /// Planner decision, when planning got that far.
    pub strategy: Option<Strategy>,
    /// Planner reason for `NoAction` (e.g. `sufficient_history`).
    pub reason: Option<String>,
    /// Number of points written to the store.
    pub records_stored: usize,
    /// Window start in epoch milliseconds, when a fetch happened.
    pub fetch_from_ms: Option<i64>,
    /// Window end in epoch milliseconds, when a fetch happened.
    pub fetch_to_ms: Option<i64>,
    /// Failure captured while processing this symbol.
    pub error: Option<PriceFeedError>,
}

impl BackfillReport {
    /// The planner decided no fetch was needed.
    pub fn no_action(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            status: BackfillStatus::NoAction,
            strategy: Some(Strategy::NoAction),
            reason: Some(reason.into()),
            records_stored: 0,
            fetch_from_ms: None,
            fetch_to_ms: None,
            error: None,
        }
    }

    /// The exchange returned an empty window.
    pub fn no_data(symbol: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            symbol: symbol.into(),
            status: BackfillStatus::NoData,
            strategy: Some(strategy),
            reason: None,
            records_stored: 0,
            fetch_from_ms: None,
            fetch_to_ms: None,
            error: None,
        }
    }

    /// Candles were stored for the window `[from_ms, to_ms]`.
    pub fn success(
        symbol: impl Into<String>,
        strategy: Strategy,
        records_stored: usize,
        from_ms: i64,
        to_ms: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            status: BackfillStatus::Success,
            strategy: Some(strategy),
            reason: None,
            records_stored,
            fetch_from_ms: Some(from_ms),
            fetch_to_ms: Some(to_ms),
            error: None,
        }
    }

    /// The symbol failed; used to isolate errors in batch sweeps.
    pub fn failed(symbol: impl Into<String>, error: PriceFeedError) -> Self {
        Self {
            symbol: symbol.into(),
            status: BackfillStatus::Error,
            strategy: None,
            reason: None,
            records_stored: 0,
            fetch_from_ms: None,
            fetch_to_ms: None,
            error: Some(error),
        }
    }
}

/// Result of capturing a live price for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceFetchReport {
    /// Exchange pair.
    pub symbol: String,
    /// Captured price.
    pub price: Option<f64>,
    /// Minute-aligned timestamp the price was stored under.
    pub timestamp: Option<i64>,
    /// Failure, if the capture did not complete.
    pub error: Option<PriceFeedError>,
}

impl PriceFetchReport {
    /// A captured and stored price.
    pub fn captured(symbol: impl Into<String>, price: f64, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price: Some(price),
            timestamp: Some(timestamp),
            error: None,
        }
    }

    /// A failed capture.
    pub fn failed(symbol: impl Into<String>, error: PriceFeedError) -> Self {
        Self {
            symbol: symbol.into(),
            price: None,
            timestamp: None,
            error: Some(error),
        }
    }

    /// Whether the price was captured and stored.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Stored-history summary for a registered symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStatus {
    /// Exchange pair.
    pub symbol: String,
    /// Registry identity.
    pub symbol_id: SymbolId,
    /// Time of first registration.
    pub registered_at: DateTime<Utc>,
    /// Number of stored points.
    pub total_records: u64,
    /// Newest stored timestamp.
    pub latest_timestamp: Option<i64>,
    /// Close of the newest stored point.
    pub latest_price: Option<f64>,
    /// Oldest stored timestamp.
    pub oldest_timestamp: Option<i64>,
}

/// Counters maintained by the heartbeat scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatStats {
    /// Beats whose handler completed successfully.
    pub beats_executed: u64,
    /// Beats whose handler returned an error or panicked.
    pub beats_failed: u64,
    /// When the scheduler was last started.
    pub start_time: Option<DateTime<Utc>>,
    /// When the most recent beat fired.
    pub last_beat_time: Option<DateTime<Utc>>,
}

impl HeartbeatStats {
    /// Whole seconds elapsed since `start_time`, measured at `now`.
    #[must_use]
    pub fn uptime_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.start_time
            .map_or(0, |start| (now - start).num_seconds().max(0))
    }
}
