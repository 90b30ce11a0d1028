use std::sync::Arc;
use std::time::Duration;

use pricefeed::{HeartbeatConfig, HeartbeatCoordinator, PriceFeedConfig, PriceStore, StopOutcome};
use pricefeed_mock::MockExchange;
use tokio::time::sleep;

use crate::helpers::{BTC, config, feed, register};

fn fast_heartbeat() -> PriceFeedConfig {
    PriceFeedConfig {
        heartbeat: HeartbeatConfig {
            interval_secs: 0,
            buffer_delay_secs: 1,
            stop_timeout: Duration::from_secs(5),
        },
        ..config()
    }
}

#[tokio::test]
async fn run_once_captures_prices() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), config());
    let btc = register(&feed, BTC).await;
    let coordinator = HeartbeatCoordinator::new(Arc::clone(&feed));

    let reports = coordinator.run_once().await.unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_success());
    assert_eq!(store.count(btc).await.unwrap(), 1);
    assert!(!coordinator.is_running());
}

#[tokio::test(start_paused = true)]
async fn beats_capture_live_prices() {
    let (feed, store) = feed(Arc::new(MockExchange::new()), fast_heartbeat());
    let btc = register(&feed, BTC).await;
    let coordinator = HeartbeatCoordinator::new(Arc::clone(&feed));

    assert!(coordinator.start());
    assert!(!coordinator.start());
    sleep(Duration::from_millis(1_500)).await;

    assert_eq!(coordinator.stats().beats_executed, 1);
    assert_eq!(store.count(btc).await.unwrap(), 1);
    assert!(
        feed.registry()
            .get(btc)
            .await
            .unwrap()
            .unwrap()
            .last_price
            .is_some()
    );
    assert_eq!(coordinator.stop().await, StopOutcome::Graceful);
    assert_eq!(coordinator.stop().await, StopOutcome::NotRunning);
}

#[tokio::test(start_paused = true)]
async fn capture_failures_do_not_fail_the_beat() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), fast_heartbeat());
    register(&feed, "TIMEOUT/USDT").await;
    let coordinator = HeartbeatCoordinator::new(Arc::clone(&feed));

    coordinator.start();
    sleep(Duration::from_millis(2_500)).await;

    let stats = coordinator.stats();
    assert_eq!(stats.beats_executed, 2);
    assert_eq!(stats.beats_failed, 0);
    coordinator.stop().await;
}

#[tokio::test]
async fn explicit_cadence_overrides_the_feed_config() {
    let (feed, _store) = feed(Arc::new(MockExchange::new()), config());
    let coordinator = HeartbeatCoordinator::with_config(
        Arc::clone(&feed),
        HeartbeatConfig {
            interval_secs: 0,
            buffer_delay_secs: 2,
            stop_timeout: Duration::from_secs(1),
        },
    );
    assert_eq!(
        coordinator.scheduler().effective_interval(),
        Duration::from_secs(2)
    );
}
