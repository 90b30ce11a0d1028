use std::sync::Arc;

use pricefeed::{BackfillConfig, BackfillStatus, PriceFeedError};
use pricefeed_mock::MockExchange;

use crate::helpers::{BTC, ETH, config, config_with, feed, register};

#[tokio::test]
async fn one_failing_symbol_does_not_stop_the_sweep() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    register(&feed, BTC).await;
    register(&feed, "FAIL/USDT").await;
    register(&feed, ETH).await;

    let reports = feed.backfill_all_symbols().await.unwrap();
    let symbols: Vec<&str> = reports.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec![BTC, ETH, "FAIL/USDT"]);
    assert_eq!(reports[0].status, BackfillStatus::Success);
    assert_eq!(reports[1].status, BackfillStatus::Success);
    assert_eq!(reports[2].status, BackfillStatus::Error);
    assert!(matches!(
        reports[2].error,
        Some(PriceFeedError::Exchange { .. })
    ));
    assert_eq!(reports[2].records_stored, 0);
}

#[tokio::test]
async fn empty_registry_sweeps_nothing() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    assert!(feed.backfill_all_symbols().await.unwrap().is_empty());
}

#[tokio::test]
async fn inactive_symbols_are_skipped() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    register(&feed, BTC).await;
    let eth = register(&feed, ETH).await;
    feed.registry().deactivate(eth).await.unwrap();

    let reports = feed.backfill_all_symbols().await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].symbol, BTC);
}

#[tokio::test]
async fn bounded_concurrency_keeps_registry_order() {
    let cfg = config_with(BackfillConfig {
        concurrency: 3,
        ..BackfillConfig::default()
    });
    let (feed, _store) = feed(Arc::new(MockExchange::new()), cfg);
    for s in ["SOL/USDT", BTC, "FAIL/USDT", ETH] {
        register(&feed, s).await;
    }

    let reports = feed.backfill_all_symbols().await.unwrap();
    let symbols: Vec<&str> = reports.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec![BTC, ETH, "FAIL/USDT", "SOL/USDT"]);
    let ok = reports
        .iter()
        .filter(|r| r.status == BackfillStatus::Success)
        .count();
    assert_eq!(ok, 3);

    let again = feed.backfill_all_symbols().await.unwrap();
    assert!(
        again
            .iter()
            .filter(|r| r.symbol != "FAIL/USDT")
            .all(|r| r.status == BackfillStatus::NoAction)
    );
}
