//! Gap-fill window planning.
//!
//! The planner turns a symbol's stored history bounds and the current time
//! into a single fetch window with a named [`Strategy`]. It performs no clock
//! access and no I/O in [`GapFillPlanner::plan`]; [`GapFillPlanner::plan_for`]
//! only reads the latest and oldest stored points before delegating.

use pricefeed_core::{
    BackfillConfig, MINUTE_MS, PriceFeedError, PriceStore, Strategy, SymbolId, last_closed_minute,
};

/// Reason attached to a skipped plan when stored history already covers the window.
pub const SUFFICIENT_HISTORY: &str = "sufficient_history";

/// Newest and oldest stored timestamps for one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryBounds {
    /// Timestamp of the newest stored point.
    pub latest_ms: Option<i64>,
    /// Timestamp of the oldest stored point.
    pub oldest_ms: Option<i64>,
}

impl HistoryBounds {
    /// Bounds of an empty history.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            latest_ms: None,
            oldest_ms: None,
        }
    }

    /// Bounds of a history spanning `[oldest_ms, latest_ms]`.
    #[must_use]
    pub const fn spanning(oldest_ms: i64, latest_ms: i64) -> Self {
        Self {
            latest_ms: Some(latest_ms),
            oldest_ms: Some(oldest_ms),
        }
    }
}

/// An exact fetch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// Decision that produced the window.
    pub strategy: Strategy,
    /// First minute to fetch, epoch milliseconds.
    pub since_ms: i64,
    /// Last fully closed minute, epoch milliseconds.
    pub until_ms: i64,
    /// Number of minutes in `[since_ms, until_ms)`.
    pub limit: u32,
}

/// Planner output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    /// Fetch candles over the window.
    Fetch(FetchWindow),
    /// Nothing to fetch.
    Skip {
        /// Why the fetch is skipped.
        reason: &'static str,
    },
}

impl FetchPlan {
    /// Strategy label of the plan.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        match self {
            Self::Fetch(w) => w.strategy,
            Self::Skip { .. } => Strategy::NoAction,
        }
    }

    /// The window, when the plan fetches.
    #[must_use]
    pub const fn window(&self) -> Option<&FetchWindow> {
        match self {
            Self::Fetch(w) => Some(w),
            Self::Skip { .. } => None,
        }
    }
}

/// Reconciles desired history, existing history and the trailing gap into one window.
///
/// Behavior and trade-offs:
/// - The gap is measured against the last fully closed minute, never raw `now`.
/// - A newest point later than that minute (clock skew) is treated as a zero gap
///   and logged, never reported as an error.
/// - Existing history is the wall-clock span between the oldest and newest
///   points; holes inside the stored range are not detected.
/// - `extend_backward` and `gap_plus_extend` refetch the full desired window;
///   already stored minutes are overwritten by the upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapFillPlanner {
    threshold_minutes: u32,
    max_gap_minutes: u32,
}

impl Default for GapFillPlanner {
    fn default() -> Self {
        Self::from_config(&BackfillConfig::default())
    }
}

impl GapFillPlanner {
    /// Planner with an explicit gap threshold and gap-fill cap, both in minutes.
    #[must_use]
    pub const fn new(threshold_minutes: u32, max_gap_minutes: u32) -> Self {
        Self {
            threshold_minutes,
            max_gap_minutes,
        }
    }

    /// Planner configured from backfill settings.
    #[must_use]
    pub const fn from_config(cfg: &BackfillConfig) -> Self {
        Self::new(cfg.gap_fill_threshold_minutes, cfg.max_gap_fill_minutes)
    }

    /// Gap size, in minutes, at or below which history counts as continuous.
    #[must_use]
    pub const fn threshold_minutes(&self) -> u32 {
        self.threshold_minutes
    }

    /// Largest window, in minutes, a gap fill may request.
    #[must_use]
    pub const fn max_gap_minutes(&self) -> u32 {
        self.max_gap_minutes
    }

    /// Compute the plan for `desired_minutes` of history at `now_ms`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `desired_minutes` is zero.
    pub fn plan(
        &self,
        desired_minutes: u32,
        now_ms: i64,
        bounds: HistoryBounds,
    ) -> Result<FetchPlan, PriceFeedError> {
        if desired_minutes == 0 {
            return Err(PriceFeedError::InvalidArg(
                "desired minutes must be at least 1".into(),
            ));
        }
        let until_ms = last_closed_minute(now_ms);
        let required_ms = i64::from(desired_minutes) * MINUTE_MS;

        let Some(latest_ms) = bounds.latest_ms else {
            return Ok(FetchPlan::Fetch(FetchWindow {
                strategy: Strategy::FullBackfill,
                since_ms: until_ms - required_ms,
                until_ms,
                limit: desired_minutes,
            }));
        };

        let mut gap_ms = until_ms - latest_ms;
        if gap_ms < 0 {
            tracing::warn!(
                gap_ms,
                latest_ms,
                until_ms,
                "clock skew detected; treating history as continuous"
            );
            gap_ms = 0;
        }

        let threshold_ms = i64::from(self.threshold_minutes) * MINUTE_MS;
        if gap_ms <= threshold_ms {
            let existing_ms = bounds.oldest_ms.map_or(0, |oldest| until_ms - oldest);
            if existing_ms >= required_ms {
                return Ok(FetchPlan::Skip {
                    reason: SUFFICIENT_HISTORY,
                });
            }
            return Ok(FetchPlan::Fetch(FetchWindow {
                strategy: Strategy::ExtendBackward,
                since_ms: until_ms - required_ms,
                until_ms,
                limit: desired_minutes,
            }));
        }

        let existing_ms = bounds.oldest_ms.map_or(0, |oldest| latest_ms - oldest);
        let (mut strategy, mut since_ms) = if gap_ms + existing_ms < required_ms {
            (Strategy::GapPlusExtend, until_ms - required_ms)
        } else {
            (Strategy::GapOnly, latest_ms + MINUTE_MS)
        };

        let max_gap_ms = i64::from(self.max_gap_minutes) * MINUTE_MS;
        if until_ms - since_ms > max_gap_ms {
            since_ms = until_ms - max_gap_ms;
            strategy = strategy.limited();
        }

        let minutes = ((until_ms - since_ms) / MINUTE_MS).max(0);
        Ok(FetchPlan::Fetch(FetchWindow {
            strategy,
            since_ms,
            until_ms,
            limit: u32::try_from(minutes).unwrap_or(u32::MAX),
        }))
    }

    /// Read the stored bounds for `symbol_id` and plan against them.
    ///
    /// # Errors
    /// Propagates store failures and the argument checks of [`plan`](Self::plan).
    pub async fn plan_for(
        &self,
        store: &dyn PriceStore,
        symbol_id: SymbolId,
        desired_minutes: u32,
        now_ms: i64,
    ) -> Result<FetchPlan, PriceFeedError> {
        let latest_ms = store.latest(symbol_id).await?.map(|p| p.timestamp);
        let bounds = if latest_ms.is_some() {
            HistoryBounds {
                latest_ms,
                oldest_ms: store.oldest(symbol_id).await?.map(|p| p.timestamp),
            }
        } else {
            HistoryBounds::empty()
        };
        self.plan(desired_minutes, now_ms, bounds)
    }
}
