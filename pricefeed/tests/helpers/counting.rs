use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pricefeed::{Candle, ExchangeConnector, OhlcvProvider, PriceFeedError, Ticker, TickerProvider};

/// Wraps a connector and counts calls per capability.
pub struct CountingExchange {
    inner: Arc<dyn ExchangeConnector>,
    pub ohlcv_calls: AtomicUsize,
    pub ticker_calls: AtomicUsize,
}

impl CountingExchange {
    pub fn new(inner: Arc<dyn ExchangeConnector>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            ohlcv_calls: AtomicUsize::new(0),
            ticker_calls: AtomicUsize::new(0),
        })
    }

    pub fn ohlcv(&self) -> usize {
        self.ohlcv_calls.load(Ordering::SeqCst)
    }

    pub fn tickers(&self) -> usize {
        self.ticker_calls.load(Ordering::SeqCst)
    }
}

impl ExchangeConnector for CountingExchange {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn now_ms(&self) -> i64 {
        self.inner.now_ms()
    }

    fn as_ticker_provider(&self) -> Option<&dyn TickerProvider> {
        Some(self as &dyn TickerProvider)
    }

    fn as_ohlcv_provider(&self) -> Option<&dyn OhlcvProvider> {
        Some(self as &dyn OhlcvProvider)
    }
}

#[async_trait]
impl TickerProvider for CountingExchange {
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, PriceFeedError> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .as_ticker_provider()
            .ok_or_else(|| PriceFeedError::unsupported("tickers"))?
            .fetch_ticker(symbol)
            .await
    }

    async fn fetch_tickers(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Ticker>, PriceFeedError> {
        self.ticker_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .as_ticker_provider()
            .ok_or_else(|| PriceFeedError::unsupported("tickers"))?
            .fetch_tickers(symbols)
            .await
    }
}

#[async_trait]
impl OhlcvProvider for CountingExchange {
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        since_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceFeedError> {
        self.ohlcv_calls.fetch_add(1, Ordering::SeqCst);
        self.inner
            .as_ohlcv_provider()
            .ok_or_else(|| PriceFeedError::unsupported("ohlcv"))?
            .fetch_ohlcv(symbol, since_ms, limit)
            .await
    }
}

/// A connector that advertises no capabilities.
pub struct Bare;

impl ExchangeConnector for Bare {
    fn name(&self) -> &'static str {
        "bare"
    }
}
