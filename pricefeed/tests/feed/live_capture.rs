use std::sync::Arc;

use pricefeed::{MINUTE_MS, PriceFeedError, PriceStore};
use pricefeed_mock::{MockExchange, NOW_MS};

use crate::helpers::{BTC, ETH, config, feed, register};

const TICKER_MINUTE: i64 = (NOW_MS - 1_234) / MINUTE_MS * MINUTE_MS;

#[tokio::test]
async fn captures_every_active_symbol() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let btc = register(&feed, BTC).await;
    let eth = register(&feed, ETH).await;

    let reports = feed.fetch_all_prices().await.unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_success()));
    assert_eq!(reports[0].symbol, BTC);
    assert_eq!(reports[0].price, Some(37_250.5));
    assert_eq!(reports[0].timestamp, Some(TICKER_MINUTE));

    let p = store.latest(btc).await.unwrap().unwrap();
    assert_eq!(p.timestamp, TICKER_MINUTE);
    assert_eq!((p.open, p.high, p.low, p.close), (37_250.5, 37_250.5, 37_250.5, 37_250.5));
    assert_eq!(p.volume, 0.0);
    assert_eq!(store.count(eth).await.unwrap(), 1);

    let cached = feed.registry().get(btc).await.unwrap().unwrap();
    assert_eq!(cached.last_price, Some(37_250.5));
}

#[tokio::test]
async fn missing_ticker_is_a_per_symbol_failure() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    register(&feed, BTC).await;
    register(&feed, "NOPE/USDT").await;

    let reports = feed.fetch_all_prices().await.unwrap();
    assert!(reports[0].is_success());
    assert_eq!(reports[1].symbol, "NOPE/USDT");
    let err = reports[1].error.as_ref().unwrap();
    assert!(err.to_string().contains("No ticker data returned for NOPE/USDT"));
}

#[tokio::test(start_paused = true)]
async fn batch_failure_fails_every_symbol() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let btc = register(&feed, BTC).await;
    register(&feed, "TIMEOUT/USDT").await;

    let reports = feed.fetch_all_prices().await.unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| matches!(
        r.error,
        Some(PriceFeedError::RequestTimeout { .. })
    )));
    assert_eq!(store.count(btc).await.unwrap(), 0);
}

#[tokio::test]
async fn empty_registry_captures_nothing() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    assert!(feed.fetch_all_prices().await.unwrap().is_empty());
}

#[tokio::test]
async fn single_symbol_capture() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let eth = register(&feed, ETH).await;

    let report = feed.fetch_price(ETH).await;
    assert!(report.is_success());
    assert_eq!(report.price, Some(2_050.25));
    assert_eq!(store.count(eth).await.unwrap(), 1);

    let missing = feed.fetch_price(BTC).await;
    assert!(!missing.is_success());
    assert_eq!(missing.error, Some(PriceFeedError::not_registered(BTC)));
}

#[tokio::test]
async fn repeated_capture_overwrites_the_same_minute() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let btc = register(&feed, BTC).await;

    feed.fetch_price(BTC).await;
    feed.fetch_price(BTC).await;
    assert_eq!(store.count(btc).await.unwrap(), 1);
}
