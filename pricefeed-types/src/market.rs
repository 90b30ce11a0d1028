//! Market records exchanged between connectors, stores and the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identity assigned to a symbol at first registration.
pub type SymbolId = i64;

/// One stored minute of OHLCV data for a symbol.
///
/// `timestamp` is milliseconds since the UNIX epoch and must be an exact
/// multiple of one minute by the time the point reaches a store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Owning symbol.
    pub symbol_id: SymbolId,
    /// Minute-aligned epoch milliseconds.
    pub timestamp: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume (0 for ticker-derived points).
    pub volume: f64,
}

impl PricePoint {
    /// Build a ticker-derived point: all four prices equal `price` and volume is zero.
    #[must_use]
    pub const fn flat(symbol_id: SymbolId, timestamp: i64, price: f64) -> Self {
        Self {
            symbol_id,
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 0.0,
        }
    }

    /// Attach a candle to a symbol, keeping the candle's timestamp unchanged.
    #[must_use]
    pub const fn from_candle(symbol_id: SymbolId, candle: &Candle) -> Self {
        Self {
            symbol_id,
            timestamp: candle.timestamp,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }
}

/// Monitoring state of a registered symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolState {
    /// Polled by the heartbeat and included in backfill sweeps.
    Active,
    /// Soft-deleted; history is kept and the row can be reactivated.
    Inactive,
}

/// A registered exchange pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// Stable identity, unchanged across deactivation and reactivation.
    pub id: SymbolId,
    /// Exchange pair, e.g. `BTC/USDT`.
    pub symbol: String,
    /// Current monitoring state.
    pub state: SymbolState,
    /// Time of first registration.
    pub created_at: DateTime<Utc>,
    /// Most recent live price captured by the heartbeat.
    pub last_price: Option<f64>,
    /// When `last_price` was captured.
    pub last_price_at: Option<DateTime<Utc>>,
}

impl Symbol {
    /// Whether the symbol is currently monitored.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == SymbolState::Active
    }
}

/// Point-in-time ticker snapshot returned by an exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Exchange pair, e.g. `BTC/USDT`.
    pub symbol: String,
    /// Last traded price.
    pub last: f64,
    /// Best bid, when reported.
    pub bid: Option<f64>,
    /// Best ask, when reported.
    pub ask: Option<f64>,
    /// Exchange timestamp in epoch milliseconds (not aligned).
    pub timestamp: i64,
    /// Quote volume over the exchange's rolling window.
    pub volume: f64,
}

/// One-minute OHLCV candle as returned by an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time in epoch milliseconds, as reported upstream.
    pub timestamp: i64,
    /// Opening price.
    pub open: f64,
    /// Highest price.
    pub high: f64,
    /// Lowest price.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Base-asset volume.
    pub volume: f64,
}
