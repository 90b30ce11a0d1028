//! Storage contracts for price history and the symbol registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::PriceFeedError;
use crate::time::is_minute_aligned;
use pricefeed_types::{PricePoint, Symbol, SymbolId, SymbolState};

pub mod memory;

/// Minute-granularity OHLCV storage keyed on `(symbol_id, timestamp)`.
///
/// Writes are upserts: writing an existing key overwrites every price field.
/// Range bounds are inclusive on both ends.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Insert or overwrite one point.
    async fn upsert(&self, point: PricePoint) -> Result<(), PriceFeedError>;

    /// Insert or overwrite a batch atomically; returns the number of points written.
    async fn upsert_many(&self, points: &[PricePoint]) -> Result<usize, PriceFeedError>;

    /// Points with `start_ms <= timestamp <= end_ms`, ascending.
    async fn range(
        &self,
        symbol_id: SymbolId,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<PricePoint>, PriceFeedError>;

    /// Newest stored point.
    async fn latest(&self, symbol_id: SymbolId) -> Result<Option<PricePoint>, PriceFeedError>;

    /// Oldest stored point.
    async fn oldest(&self, symbol_id: SymbolId) -> Result<Option<PricePoint>, PriceFeedError>;

    /// Up to `limit` points strictly before `ts_ms`, newest first.
    async fn before(
        &self,
        symbol_id: SymbolId,
        ts_ms: i64,
        limit: usize,
    ) -> Result<Vec<PricePoint>, PriceFeedError>;

    /// Up to `limit` points strictly after `ts_ms`, oldest first.
    async fn after(
        &self,
        symbol_id: SymbolId,
        ts_ms: i64,
        limit: usize,
    ) -> Result<Vec<PricePoint>, PriceFeedError>;

    /// Number of stored points for a symbol.
    async fn count(&self, symbol_id: SymbolId) -> Result<u64, PriceFeedError>;

    /// Delete points in `[start_ms, end_ms]`; returns how many were removed.
    async fn delete_range(
        &self,
        symbol_id: SymbolId,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<u64, PriceFeedError>;

    /// Cheap reachability check used by health checks.
    async fn ping(&self) -> Result<(), PriceFeedError> {
        Ok(())
    }
}

/// Persistence for registered symbols. Listings are ordered by pair name.
#[async_trait]
pub trait SymbolStore: Send + Sync {
    /// Create a new active row for `symbol`.
    async fn insert(
        &self,
        symbol: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Symbol, PriceFeedError>;

    /// Look up by identity.
    async fn by_id(&self, id: SymbolId) -> Result<Option<Symbol>, PriceFeedError>;

    /// Look up by pair name, regardless of state.
    async fn by_name(&self, symbol: &str) -> Result<Option<Symbol>, PriceFeedError>;

    /// All symbols, or only active ones.
    async fn list(&self, active_only: bool) -> Result<Vec<Symbol>, PriceFeedError>;

    /// Change the monitoring state; returns false when the id does not exist.
    async fn set_state(&self, id: SymbolId, state: SymbolState) -> Result<bool, PriceFeedError>;

    /// Record a live price; returns false when the id does not exist.
    async fn set_last_price(
        &self,
        id: SymbolId,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, PriceFeedError>;
}

/// Validate a point before it is written.
///
/// # Errors
/// Returns `PriceFeedError::Data` if the timestamp is not minute-aligned or any
/// price or volume field is negative or not finite.
pub fn check_point(p: &PricePoint) -> Result<(), PriceFeedError> {
    if !is_minute_aligned(p.timestamp) {
        return Err(PriceFeedError::Data(format!(
            "timestamp {} for symbol {} is not minute-aligned",
            p.timestamp, p.symbol_id
        )));
    }
    for (field, v) in [
        ("open", p.open),
        ("high", p.high),
        ("low", p.low),
        ("close", p.close),
        ("volume", p.volume),
    ] {
        if !v.is_finite() || v < 0.0 {
            return Err(PriceFeedError::Data(format!(
                "{field}={v} at {} for symbol {} must be a non-negative number",
                p.timestamp, p.symbol_id
            )));
        }
    }
    Ok(())
}
