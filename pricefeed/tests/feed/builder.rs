use std::sync::Arc;

use pricefeed::{BackfillConfig, InMemoryStore, PriceFeed, PriceFeedConfig, PriceFeedError};
use pricefeed_mock::MockExchange;

#[test]
fn build_requires_an_exchange_and_both_stores() {
    let store = Arc::new(InMemoryStore::new());
    let err = PriceFeed::builder()
        .with_store(Arc::clone(&store))
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, PriceFeedError::InvalidArg(_)));

    let err = PriceFeed::builder()
        .with_exchange(Arc::new(MockExchange::new()))
        .with_price_store(store)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, PriceFeedError::InvalidArg(ref m) if m.contains("symbol store")));
}

#[test]
fn build_validates_configuration() {
    let cfg = PriceFeedConfig {
        backfill: BackfillConfig {
            backfill_minutes: 0,
            ..BackfillConfig::default()
        },
        ..PriceFeedConfig::default()
    };
    let err = PriceFeed::builder()
        .with_exchange(Arc::new(MockExchange::new()))
        .with_store(Arc::new(InMemoryStore::new()))
        .config(cfg)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, PriceFeedError::InvalidConfig(_)));
}

#[tokio::test]
async fn builder_modifiers_reach_the_planner() {
    let feed = PriceFeed::builder()
        .with_exchange(Arc::new(MockExchange::new()))
        .with_store(Arc::new(InMemoryStore::new()))
        .backfill(BackfillConfig {
            gap_fill_threshold_minutes: 3,
            max_gap_fill_minutes: 42,
            ..BackfillConfig::default()
        })
        .build()
        .unwrap();
    assert_eq!(feed.planner().threshold_minutes(), 3);
    assert_eq!(feed.planner().max_gap_minutes(), 42);
    assert_eq!(feed.exchange().name(), "pricefeed-mock");
    assert!(feed.health().await.is_ok());
}
