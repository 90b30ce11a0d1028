//! Mock exchange connectors for CI-safe tests and demos.
//!
//! - [`MockExchange`] serves deterministic fixtures with a frozen clock.
//! - [`DynamicMockExchange`] defers every call to a [`DynamicMockController`]
//!   so tests can script failures, hangs and clock movement.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use pricefeed_core::connector::{ExchangeConnector, OhlcvProvider, TickerProvider};
use pricefeed_core::{Candle, PriceFeedError, Ticker, last_closed_minute};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockController, DynamicMockExchange, MockBehavior, OhlcvCall};
pub use fixtures::NOW_MS;

/// Mock connector backed by static fixtures.
///
/// Known pairs are `BTC/USDT`, `ETH/USDT` and `SOL/USDT`. A few magic pairs
/// exercise error paths: `FAIL/USDT` fails permanently, `TIMEOUT/USDT` always
/// times out (retryable) and `EMPTY/USDT` has a ticker but no candles.
pub struct MockExchange {
    now_ms: AtomicI64,
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExchange {
    /// Create a mock whose clock is frozen at [`NOW_MS`].
    #[must_use]
    pub const fn new() -> Self {
        Self::at(NOW_MS)
    }

    /// Create a mock whose clock is frozen at `now_ms`.
    #[must_use]
    pub const fn at(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Move the frozen clock.
    pub fn set_now_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    fn maybe_fail_or_timeout(symbol: &str, capability: &'static str) -> Result<(), PriceFeedError> {
        match symbol {
            "FAIL/USDT" => Err(PriceFeedError::exchange(
                "pricefeed-mock",
                format!("forced failure: {capability}"),
            )),
            "TIMEOUT/USDT" => Err(PriceFeedError::request_timeout(
                "pricefeed-mock",
                capability,
            )),
            _ => Ok(()),
        }
    }
}

impl ExchangeConnector for MockExchange {
    fn name(&self) -> &'static str {
        "pricefeed-mock"
    }

    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn as_ticker_provider(&self) -> Option<&dyn TickerProvider> {
        Some(self as &dyn TickerProvider)
    }

    fn as_ohlcv_provider(&self) -> Option<&dyn OhlcvProvider> {
        Some(self as &dyn OhlcvProvider)
    }
}

#[async_trait]
impl TickerProvider for MockExchange {
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, PriceFeedError> {
        Self::maybe_fail_or_timeout(symbol, "ticker")?;
        if symbol == "EMPTY/USDT" {
            return Ok(Ticker {
                symbol: symbol.to_string(),
                last: 1.0,
                bid: None,
                ask: None,
                timestamp: self.now_ms(),
                volume: 0.0,
            });
        }
        fixtures::tickers::by_symbol(symbol)
            .ok_or_else(|| PriceFeedError::BadSymbol(symbol.to_string()))
    }
}

#[async_trait]
impl OhlcvProvider for MockExchange {
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        since_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceFeedError> {
        Self::maybe_fail_or_timeout(symbol, "ohlcv")?;
        if symbol == "EMPTY/USDT" {
            return Ok(Vec::new());
        }
        let base = fixtures::candles::base_price(symbol)
            .ok_or_else(|| PriceFeedError::BadSymbol(symbol.to_string()))?;
        Ok(fixtures::candles::series(
            base,
            since_ms,
            limit,
            last_closed_minute(self.now_ms()),
        ))
    }
}
