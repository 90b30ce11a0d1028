//! Pricefeed data transfer objects, reports, errors and configuration primitives.
#![warn(missing_docs)]

mod config;
mod error;
mod market;
mod reports;

pub use config::{
    BackfillConfig, HeartbeatConfig, MAX_BACKFILL_MINUTES, MAX_HEARTBEAT_BUFFER_SECS,
    MIN_HEARTBEAT_INTERVAL_SECS, PriceFeedConfig, RetryConfig,
};
pub use error::PriceFeedError;
pub use market::{Candle, PricePoint, Symbol, SymbolId, SymbolState, Ticker};
pub use reports::{
    BackfillReport, BackfillStatus, HeartbeatStats, HistoryStatus, PriceFetchReport, Strategy,
};
