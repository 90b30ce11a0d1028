//! Pricefeed keeps minute-granularity price history for crypto pairs.
//!
//! Overview
//! - Registers symbols and caches their state and last live price.
//! - Plans gap-aware backfills: given stored history and the current time it
//!   picks one fetch window and a named strategy.
//! - Fetches candles under an exponential retry policy, floors timestamps to
//!   the minute and upserts them in one batch.
//! - Captures live prices on a heartbeat aligned to minute boundaries.
//!
//! Key behaviors and trade-offs
//! - Planning:
//!   - Gaps are measured against the last fully closed minute; clock skew is
//!     treated as no gap.
//!   - Existing history is the span between oldest and newest points, so holes
//!     inside stored history are not detected.
//!   - Gap fills are capped by `max_gap_fill_minutes`; the strategy label
//!     gains a `_limited` suffix when the cap applies.
//! - Errors: only transient exchange errors are retried. Batch operations
//!   isolate failures per symbol and report them instead of aborting.
//! - Writes are upserts keyed on `(symbol_id, timestamp)`; concurrent writers
//!   on the same minute resolve last-write-wins.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use pricefeed::{HeartbeatCoordinator, InMemoryStore, PriceFeed};
//!
//! let feed = Arc::new(
//!     PriceFeed::builder()
//!         .with_exchange(exchange)
//!         .with_store(Arc::new(InMemoryStore::new()))
//!         .build()?,
//! );
//! feed.registry().register("BTC/USDT").await?;
//! let report = feed.backfill_symbol("BTC/USDT", None).await?;
//!
//! let heartbeat = HeartbeatCoordinator::new(Arc::clone(&feed));
//! heartbeat.start();
//! // ...
//! heartbeat.stop().await;
//! ```
#![warn(missing_docs)]

mod backfill;
pub(crate) mod core;
/// Heartbeat scheduler and live capture coordinator.
pub mod heartbeat;
mod live;
/// Gap-fill window planner.
pub mod planner;
mod registry;

pub use core::{PriceFeed, PriceFeedBuilder};
pub use heartbeat::{
    BeatHandler, HeartbeatCoordinator, HeartbeatScheduler, StopOutcome, handler_fn,
};
pub use planner::{FetchPlan, FetchWindow, GapFillPlanner, HistoryBounds, SUFFICIENT_HISTORY};
pub use registry::SymbolRegistry;

// Re-export core types for convenience
pub use pricefeed_core::{
    BackfillConfig, BackfillReport, BackfillStatus, Candle, ExchangeConnector, HeartbeatConfig,
    HeartbeatStats, HistoryStatus, InMemoryStore, MINUTE_MS, OhlcvProvider, PriceFeedConfig,
    PriceFeedError, PriceFetchReport, PricePoint, PriceStore, RetryConfig, RetryPolicy, Strategy,
    Symbol, SymbolId, SymbolState, SymbolStore, Ticker, TickerProvider, floor_to_minute,
    last_closed_minute,
};
