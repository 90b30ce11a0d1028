use std::sync::Arc;

use pricefeed::{
    BackfillConfig, BackfillStatus, Candle, MINUTE_MS, PriceFeedError, PriceStore, Strategy,
};
use pricefeed_mock::{DynamicMockExchange, MockBehavior, MockExchange, NOW_MS};

use crate::helpers::{
    BTC, Bare, CountingExchange, UNTIL, config, config_with, feed, register, seed,
};

#[tokio::test]
async fn empty_store_runs_a_full_backfill() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let id = register(&feed, BTC).await;

    let report = feed.backfill_symbol(BTC, None).await.unwrap();
    assert_eq!(report.status, BackfillStatus::Success);
    assert_eq!(report.strategy, Some(Strategy::FullBackfill));
    assert_eq!(report.records_stored, 6);
    assert_eq!(report.fetch_from_ms, Some(UNTIL - 5 * MINUTE_MS));
    assert_eq!(report.fetch_to_ms, Some(UNTIL));

    assert_eq!(store.count(id).await.unwrap(), 6);
    assert_eq!(store.latest(id).await.unwrap().unwrap().timestamp, UNTIL);
}

#[tokio::test]
async fn sufficient_history_never_calls_the_exchange() {
    let counting = CountingExchange::new(Arc::new(MockExchange::new()));
    let (feed, store) = feed(counting.clone(), config());
    let id = register(&feed, BTC).await;
    seed(&store, id, UNTIL, 10).await;

    let report = feed.backfill_symbol(BTC, None).await.unwrap();
    assert_eq!(report.status, BackfillStatus::NoAction);
    assert_eq!(report.reason.as_deref(), Some("sufficient_history"));
    assert_eq!(report.records_stored, 0);
    assert_eq!(counting.ohlcv(), 0);
    assert_eq!(store.count(id).await.unwrap(), 10);
}

#[tokio::test]
async fn repeated_backfill_is_idempotent() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let id = register(&feed, BTC).await;

    feed.backfill_symbol(BTC, None).await.unwrap();
    let before = store.count(id).await.unwrap();
    let second = feed.backfill_symbol(BTC, None).await.unwrap();
    assert_eq!(second.status, BackfillStatus::NoAction);
    assert_eq!(store.count(id).await.unwrap(), before);
}

#[tokio::test]
async fn unregistered_symbol_fails_before_any_exchange_call() {
    let counting = CountingExchange::new(Arc::new(MockExchange::new()));
    let (feed, _store) = feed(counting.clone(), config());

    let err = feed.backfill_symbol(BTC, None).await.unwrap_err();
    assert_eq!(err, PriceFeedError::not_registered(BTC));
    assert!(err.to_string().contains("not registered"));
    assert_eq!(counting.ohlcv(), 0);
}

#[tokio::test]
async fn empty_exchange_response_is_no_data() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let id = register(&feed, "EMPTY/USDT").await;

    let report = feed.backfill_symbol("EMPTY/USDT", None).await.unwrap();
    assert_eq!(report.status, BackfillStatus::NoData);
    assert_eq!(report.strategy, Some(Strategy::FullBackfill));
    assert!(report.error.is_none());
    assert_eq!(store.count(id).await.unwrap(), 0);
}

#[tokio::test]
async fn trailing_gap_is_filled_from_the_newest_point() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let id = register(&feed, BTC).await;
    seed(&store, id, UNTIL - 10 * MINUTE_MS, 30).await;

    let report = feed.backfill_symbol(BTC, None).await.unwrap();
    assert_eq!(report.strategy, Some(Strategy::GapOnly));
    assert_eq!(report.fetch_from_ms, Some(UNTIL - 9 * MINUTE_MS));
    assert_eq!(report.records_stored, 10);
    assert_eq!(store.count(id).await.unwrap(), 40);
    assert_eq!(store.latest(id).await.unwrap().unwrap().timestamp, UNTIL);
}

#[tokio::test]
async fn gap_threshold_boundary() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());

    // two minutes behind: a gap
    let a = register(&feed, BTC).await;
    seed(&store, a, UNTIL - 2 * MINUTE_MS, 30).await;
    let report = feed.backfill_symbol(BTC, None).await.unwrap();
    assert_eq!(report.strategy, Some(Strategy::GapOnly));

    // one minute behind: continuous
    let b = register(&feed, "ETH/USDT").await;
    seed(&store, b, UNTIL - MINUTE_MS, 30).await;
    let report = feed.backfill_symbol("ETH/USDT", None).await.unwrap();
    assert_eq!(report.status, BackfillStatus::NoAction);
}

#[tokio::test]
async fn long_outage_is_clamped_to_the_gap_fill_cap() {
    let cfg = config_with(BackfillConfig {
        max_gap_fill_minutes: 10,
        ..BackfillConfig::default()
    });
    let (feed, store) = feed(Arc::new(MockExchange::new()), cfg);
    let id = register(&feed, BTC).await;
    seed(&store, id, UNTIL - 100 * MINUTE_MS, 30).await;

    let report = feed.backfill_symbol(BTC, None).await.unwrap();
    assert_eq!(report.strategy, Some(Strategy::GapOnlyLimited));
    let (from, to) = (report.fetch_from_ms.unwrap(), report.fetch_to_ms.unwrap());
    assert_eq!(to - from, 600_000);
    assert_eq!(report.records_stored, 11);
}

#[tokio::test]
async fn future_points_are_treated_as_continuous_history() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let id = register(&feed, BTC).await;
    seed(&store, id, UNTIL + 2 * MINUTE_MS, 10).await;

    let report = feed.backfill_symbol(BTC, None).await.unwrap();
    assert_eq!(report.status, BackfillStatus::NoAction);
}

#[tokio::test]
async fn upstream_timestamps_are_floored_to_the_minute() {
    let (mock, ctl) = DynamicMockExchange::new_with_controller("dyn", NOW_MS);
    let candles: Vec<Candle> = (0..3)
        .rev()
        .map(|i| Candle {
            timestamp: UNTIL - i * MINUTE_MS + 1_234,
            open: 10.0,
            high: 11.0,
            low: 9.0,
            close: 10.5,
            volume: 3.0,
        })
        .collect();
    ctl.set_ohlcv_behavior(BTC, MockBehavior::Return(candles)).await;

    let (feed, store) = feed(mock, config());
    let id = register(&feed, BTC).await;
    let report = feed.backfill_symbol(BTC, None).await.unwrap();
    assert_eq!(report.records_stored, 3);

    let stored = store.range(id, UNTIL - 2 * MINUTE_MS, UNTIL).await.unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|p| p.timestamp % MINUTE_MS == 0));
    assert_eq!(stored[2].timestamp, UNTIL);
}

#[tokio::test]
async fn explicit_minutes_override_the_configured_window() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    register(&feed, BTC).await;

    let report = feed.backfill_symbol(BTC, Some(20)).await.unwrap();
    assert_eq!(report.fetch_from_ms, Some(UNTIL - 20 * MINUTE_MS));
    assert_eq!(report.records_stored, 21);

    let err = feed.backfill_symbol(BTC, Some(0)).await.unwrap_err();
    assert!(matches!(err, PriceFeedError::InvalidArg(_)));
}

#[tokio::test]
async fn connector_without_candles_is_unsupported() {
    let (feed, _store) = feed(Arc::new(Bare), config());
    register(&feed, BTC).await;

    let err = feed.backfill_symbol(BTC, None).await.unwrap_err();
    assert!(matches!(err, PriceFeedError::Unsupported { .. }));
}

#[tokio::test]
async fn deactivated_symbols_can_still_be_backfilled_on_demand() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let id = register(&feed, BTC).await;
    assert!(feed.registry().deactivate(id).await.unwrap());

    let report = feed.backfill_symbol(BTC, None).await.unwrap();
    assert_eq!(report.status, BackfillStatus::Success);
    assert_eq!(store.count(id).await.unwrap(), 6);
}

#[tokio::test]
async fn status_summarizes_stored_history() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    let id = register(&feed, BTC).await;

    let empty = feed.backfill_status(BTC).await.unwrap();
    assert_eq!(empty.symbol_id, id);
    assert_eq!(empty.total_records, 0);
    assert!(empty.latest_timestamp.is_none());

    feed.backfill_symbol(BTC, None).await.unwrap();
    let status = feed.backfill_status(BTC).await.unwrap();
    assert_eq!(status.total_records, 6);
    assert_eq!(status.latest_timestamp, Some(UNTIL));
    assert_eq!(status.oldest_timestamp, Some(UNTIL - 5 * MINUTE_MS));
    assert!(status.latest_price.is_some());

    assert!(matches!(
        feed.backfill_status("NOPE/USDT").await,
        Err(PriceFeedError::NotRegistered { .. })
    ));
}

#[tokio::test]
async fn padded_names_resolve_to_the_registered_symbol() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let id = register(&feed, BTC).await;

    let report = feed.backfill_symbol(" BTC/USDT ", None).await.unwrap();
    assert_eq!(report.status, BackfillStatus::Success);
    assert_eq!(report.symbol, BTC);
    assert_eq!(store.count(id).await.unwrap(), 6);
}
