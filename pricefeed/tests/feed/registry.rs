use std::sync::Arc;

use pricefeed::{PriceFeedError, SymbolRegistry, SymbolState};
use pricefeed_mock::MockExchange;
use tokio_test::{assert_err, assert_ok};

use crate::helpers::{BTC, ETH, GatedSymbols, SOL, config, feed};

#[tokio::test]
async fn register_deactivate_reactivate_keeps_identity() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    let reg = feed.registry();

    let first = assert_ok!(reg.register(BTC).await);
    assert!(first.is_active());

    let err = assert_err!(reg.register(BTC).await);
    assert_eq!(err, PriceFeedError::already_active(BTC));

    assert!(reg.deactivate(first.id).await.unwrap());
    assert_eq!(
        reg.get(first.id).await.unwrap().unwrap().state,
        SymbolState::Inactive
    );
    assert!(reg.list_active().await.unwrap().is_empty());

    let again = reg.register(BTC).await.unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(again.created_at, first.created_at);
    assert!(again.is_active());
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    assert!(matches!(
        feed.registry().register("   ").await,
        Err(PriceFeedError::InvalidArg(_))
    ));
}

#[tokio::test]
async fn cached_listings_follow_mutations() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    let reg = feed.registry();

    reg.register(SOL).await.unwrap();
    assert_eq!(reg.list_active().await.unwrap().len(), 1);

    let btc = reg.register(BTC).await.unwrap();
    reg.register(ETH).await.unwrap();
    let names: Vec<String> = reg
        .list_active()
        .await
        .unwrap()
        .iter()
        .map(|s| s.symbol.clone())
        .collect();
    assert_eq!(names, vec![BTC, ETH, SOL]);

    reg.deactivate(btc.id).await.unwrap();
    assert_eq!(reg.list_active().await.unwrap().len(), 2);
    assert_eq!(reg.list_all().await.unwrap().len(), 3);
    assert_eq!(reg.list_all().await.unwrap()[0].symbol, BTC);
}

#[tokio::test]
async fn last_price_updates_are_visible_through_the_cache() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    let reg = feed.registry();
    let btc = reg.register(BTC).await.unwrap();

    // warm both caches
    assert!(reg.get(btc.id).await.unwrap().unwrap().last_price.is_none());
    assert!(reg.get_by_name(BTC).await.unwrap().is_some());

    assert!(reg.update_last_price(btc.id, 42.5).await.unwrap());
    let by_id = reg.get(btc.id).await.unwrap().unwrap();
    assert_eq!(by_id.last_price, Some(42.5));
    assert!(by_id.last_price_at.is_some());
    assert_eq!(
        reg.get_by_name(BTC).await.unwrap().unwrap().last_price,
        Some(42.5)
    );

    assert!(!reg.update_last_price(9_999, 1.0).await.unwrap());
    assert!(!reg.deactivate(9_999).await.unwrap());
}

#[tokio::test]
async fn require_reports_not_registered() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    assert_eq!(
        feed.registry().require(BTC).await.unwrap_err(),
        PriceFeedError::not_registered(BTC)
    );
    assert!(feed.registry().get_by_name(BTC).await.unwrap().is_none());
}

#[tokio::test]
async fn a_listing_read_before_registration_is_not_cached() {
    let symbols = GatedSymbols::new();
    let reg = Arc::new(SymbolRegistry::new(symbols.clone()));

    symbols.hold_next_list();
    let reader = tokio::spawn({
        let reg = Arc::clone(&reg);
        async move { reg.list_active().await.unwrap().len() }
    });
    symbols.read_done.notified().await;

    reg.register(BTC).await.unwrap();
    symbols.release.notify_one();
    assert_eq!(reader.await.unwrap(), 0);

    let active = reg.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].symbol, BTC);
}

#[tokio::test]
async fn a_lookup_read_before_a_price_update_is_not_cached() {
    let symbols = GatedSymbols::new();
    let reg = Arc::new(SymbolRegistry::new(symbols.clone()));
    let btc = reg.register(BTC).await.unwrap();

    symbols.hold_next_by_name();
    let reader = tokio::spawn({
        let reg = Arc::clone(&reg);
        async move { reg.get_by_name(BTC).await.unwrap().unwrap().last_price }
    });
    symbols.read_done.notified().await;

    assert!(reg.update_last_price(btc.id, 42.5).await.unwrap());
    symbols.release.notify_one();
    assert_eq!(reader.await.unwrap(), None);

    assert_eq!(
        reg.get_by_name(BTC).await.unwrap().unwrap().last_price,
        Some(42.5)
    );
}

#[tokio::test]
async fn lookups_trim_the_name_like_registration() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    let btc = feed.registry().register(" BTC/USDT ").await.unwrap();
    assert_eq!(btc.symbol, BTC);
    assert_eq!(feed.registry().require("  BTC/USDT\t").await.unwrap().id, btc.id);
    assert_eq!(
        feed.registry().require("  ").await.unwrap_err(),
        PriceFeedError::not_registered("")
    );
}
