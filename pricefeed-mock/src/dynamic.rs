use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use pricefeed_core::connector::{ExchangeConnector, OhlcvProvider, TickerProvider};
use pricefeed_core::{Candle, PriceFeedError, Ticker};

/// Instruction for how a method should behave for a given input.
#[derive(Clone)]
pub enum MockBehavior<T> {
    /// Return the provided value immediately.
    Return(T),
    /// Fail immediately with the provided error.
    Fail(PriceFeedError),
    /// Fail the next `n` calls with the error, then return the value.
    FailTimes(u32, PriceFeedError, T),
    /// Hang indefinitely (simulate a stalled request).
    Hang,
}

/// One recorded `fetch_ohlcv` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OhlcvCall {
    /// Requested pair.
    pub symbol: String,
    /// Requested window start.
    pub since_ms: i64,
    /// Requested candle limit.
    pub limit: u32,
}

#[derive(Default)]
struct InternalState {
    ticker_rules: HashMap<String, MockBehavior<Ticker>>,
    tickers_rule: Option<MockBehavior<HashMap<String, Ticker>>>,
    ohlcv_rules: HashMap<String, MockBehavior<Vec<Candle>>>,
    ohlcv_calls: Vec<OhlcvCall>,
    ticker_calls: Vec<String>,
    tickers_calls: Vec<Vec<String>>,
}

/// Resolve a behavior, advancing `FailTimes` counters in place.
fn take_outcome<T: Clone>(slot: &mut MockBehavior<T>) -> Option<Result<T, PriceFeedError>> {
    match slot {
        MockBehavior::Return(v) => Some(Ok(v.clone())),
        MockBehavior::Fail(e) => Some(Err(e.clone())),
        MockBehavior::FailTimes(n, e, v) => {
            if *n == 0 {
                Some(Ok(v.clone()))
            } else {
                *n -= 1;
                Some(Err(e.clone()))
            }
        }
        MockBehavior::Hang => None,
    }
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
    now_ms: Arc<AtomicI64>,
}

impl DynamicMockController {
    /// Move the exchange clock.
    pub fn set_now_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Set the behavior for `fetch_ticker` calls for a specific pair.
    ///
    /// `Return` rules also feed the default batch `fetch_tickers` response.
    pub async fn set_ticker_behavior(&self, symbol: &str, behavior: MockBehavior<Ticker>) {
        let mut guard = self.state.lock().await;
        guard.ticker_rules.insert(symbol.to_string(), behavior);
    }

    /// Override the batch `fetch_tickers` response.
    pub async fn set_tickers_behavior(&self, behavior: MockBehavior<HashMap<String, Ticker>>) {
        let mut guard = self.state.lock().await;
        guard.tickers_rule = Some(behavior);
    }

    /// Set the behavior for `fetch_ohlcv` calls for a specific pair.
    pub async fn set_ohlcv_behavior(&self, symbol: &str, behavior: MockBehavior<Vec<Candle>>) {
        let mut guard = self.state.lock().await;
        guard.ohlcv_rules.insert(symbol.to_string(), behavior);
    }

    /// Recorded `fetch_ohlcv` calls, in call order.
    pub async fn ohlcv_calls(&self) -> Vec<OhlcvCall> {
        self.state.lock().await.ohlcv_calls.clone()
    }

    /// Recorded `fetch_ticker` pairs, in call order.
    pub async fn ticker_calls(&self) -> Vec<String> {
        self.state.lock().await.ticker_calls.clone()
    }

    /// Recorded `fetch_tickers` batches, in call order.
    pub async fn tickers_calls(&self) -> Vec<Vec<String>> {
        self.state.lock().await.tickers_calls.clone()
    }

    /// Clear all configured behaviors and call logs.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        *guard = InternalState::default();
    }
}

/// A connector that defers all behavior to an external controller.
pub struct DynamicMockExchange {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
    now_ms: Arc<AtomicI64>,
}

impl DynamicMockExchange {
    /// Create a new dynamic mock exchange with its clock at `now_ms`, plus its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
        now_ms: i64,
    ) -> (Arc<dyn ExchangeConnector>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let clock = Arc::new(AtomicI64::new(now_ms));
        let controller = DynamicMockController {
            state: Arc::clone(&state),
            now_ms: Arc::clone(&clock),
        };
        let me = Arc::new(Self {
            name,
            state,
            now_ms: clock,
        });
        (me as Arc<dyn ExchangeConnector>, controller)
    }
}

impl ExchangeConnector for DynamicMockExchange {
    fn name(&self) -> &'static str {
        self.name
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
impl TickerProvider for DynamicMockExchange {
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, PriceFeedError> {
        // resolve the outcome without holding the lock across the hang
        let outcome = {
            let mut guard = self.state.lock().await;
            guard.ticker_calls.push(symbol.to_string());
            match guard.ticker_rules.get_mut(symbol) {
                Some(rule) => take_outcome(rule),
                None => Some(Err(PriceFeedError::BadSymbol(symbol.to_string()))),
            }
        };
        match outcome {
            Some(r) => r,
            None => std::future::pending().await,
        }
    }

    async fn fetch_tickers(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Ticker>, PriceFeedError> {
        let outcome = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            state.tickers_calls.push(symbols.to_vec());
            if let Some(rule) = state.tickers_rule.as_mut() {
                take_outcome(rule)
            } else {
                let found = symbols
                    .iter()
                    .filter_map(|s| match state.ticker_rules.get(s) {
                        Some(MockBehavior::Return(t)) => Some((s.clone(), t.clone())),
                        _ => None,
                    })
                    .collect();
                Some(Ok(found))
            }
        };
        match outcome {
            Some(r) => r,
            None => std::future::pending().await,
        }
    }
}

#[async_trait]
impl OhlcvProvider for DynamicMockExchange {
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        since_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceFeedError> {
        let outcome = {
            let mut guard = self.state.lock().await;
            guard.ohlcv_calls.push(OhlcvCall {
                symbol: symbol.to_string(),
                since_ms,
                limit,
            });
            match guard.ohlcv_rules.get_mut(symbol) {
                Some(rule) => take_outcome(rule),
                None => Some(Ok(Vec::new())),
            }
        };
        match outcome {
            Some(r) => r,
            None => std::future::pending().await,
        }
    }
}
