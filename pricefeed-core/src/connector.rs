use std::collections::HashMap;

use async_trait::async_trait;

use crate::PriceFeedError;
use pricefeed_types::{Candle, Ticker};

/// Focused role trait for connectors that provide live tickers.
#[async_trait]
pub trait TickerProvider: Send + Sync {
    /// Fetch the current ticker for a single pair (e.g. `BTC/USDT`).
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, PriceFeedError>;

    /// Fetch tickers for many pairs in one call.
    ///
    /// Pairs missing from the returned map are per-symbol absences, not a
    /// batch failure. The default implementation calls [`fetch_ticker`] per
    /// pair: transient errors abort the batch, other errors leave the pair out.
    ///
    /// [`fetch_ticker`]: TickerProvider::fetch_ticker
    async fn fetch_tickers(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Ticker>, PriceFeedError> {
        let mut out = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            match self.fetch_ticker(symbol).await {
                Ok(t) => {
                    out.insert(symbol.clone(), t);
                }
                Err(e) if e.is_retryable() => return Err(e),
                Err(_) => {}
            }
        }
        Ok(out)
    }
}

/// Focused role trait for connectors that provide one-minute OHLCV candles.
#[async_trait]
pub trait OhlcvProvider: Send + Sync {
    /// Fetch up to `limit` one-minute candles starting at `since_ms`, ascending by time.
    ///
    /// Timestamps are returned as reported upstream; callers normalize them.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        since_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceFeedError>;
}

/// Primary exchange interface. Capabilities are discovered via `as_*_provider`.
///
/// Errors returned by provider methods must be classified: transient
/// conditions map to `Network`, `ExchangeUnavailable` or `RequestTimeout`
/// so the orchestrator's retry policy can recognize them.
pub trait ExchangeConnector: Send + Sync {
    /// A stable identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Exchange clock in epoch milliseconds.
    ///
    /// The default reads the local wall clock. Connectors that track server
    /// time, and test doubles with a frozen clock, override this.
    fn now_ms(&self) -> i64 {
        crate::time::now_ms()
    }

    /// Advertise ticker capability by returning a usable trait object reference when supported.
    fn as_ticker_provider(&self) -> Option<&dyn TickerProvider> {
        None
    }

    /// Advertise candle capability by returning a usable trait object reference when supported.
    fn as_ohlcv_provider(&self) -> Option<&dyn OhlcvProvider> {
        None
    }
}
