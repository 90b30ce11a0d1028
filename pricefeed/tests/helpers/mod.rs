#![allow(dead_code)]

pub mod counting;
pub mod gated;

pub use counting::{Bare, CountingExchange};
pub use gated::GatedSymbols;

use std::sync::Arc;

use pricefeed::{
    BackfillConfig, ExchangeConnector, InMemoryStore, MINUTE_MS, PriceFeed, PriceFeedConfig,
    PricePoint, PriceStore, RetryConfig, SymbolId, last_closed_minute,
};
use pricefeed_mock::NOW_MS;

pub const BTC: &str = "BTC/USDT";
pub const ETH: &str = "ETH/USDT";
pub const SOL: &str = "SOL/USDT";

/// Last closed minute at the mock clock.
pub const UNTIL: i64 = last_closed_minute(NOW_MS);

/// Retry settings that keep paused-clock tests short.
pub const fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_delay_ms: 10,
        max_delay_ms: 100,
        factor: 2,
        jitter_percent: 0,
    }
}

pub fn config() -> PriceFeedConfig {
    PriceFeedConfig {
        retry: fast_retry(),
        ..PriceFeedConfig::default()
    }
}

pub fn config_with(backfill: BackfillConfig) -> PriceFeedConfig {
    PriceFeedConfig {
        backfill,
        ..config()
    }
}

/// Feed over a fresh in-memory store.
pub fn feed(
    exchange: Arc<dyn ExchangeConnector>,
    cfg: PriceFeedConfig,
) -> (Arc<PriceFeed>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let feed = PriceFeed::builder()
        .with_exchange(exchange)
        .with_store(Arc::clone(&store))
        .config(cfg)
        .build()
        .unwrap();
    (Arc::new(feed), store)
}

/// Store `minutes` continuous points ending at `last_ms` (inclusive).
pub async fn seed(store: &InMemoryStore, id: SymbolId, last_ms: i64, minutes: i64) {
    let points: Vec<PricePoint> = (0..minutes)
        .map(|i| PricePoint::flat(id, last_ms - i * MINUTE_MS, 100.0))
        .collect();
    store.upsert_many(&points).await.unwrap();
}

/// Register `symbol` and return its id.
pub async fn register(feed: &PriceFeed, symbol: &str) -> SymbolId {
    feed.registry().register(symbol).await.unwrap().id
}
