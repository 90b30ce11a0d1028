use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pricefeed::{HeartbeatConfig, HeartbeatScheduler, PriceFeedError, StopOutcome, handler_fn};
use tokio::time::{Instant, sleep};

fn cadence(buffer_secs: u64) -> HeartbeatConfig {
    HeartbeatConfig {
        interval_secs: 0,
        buffer_delay_secs: buffer_secs,
        stop_timeout: Duration::from_secs(5),
    }
}

fn counting_scheduler(cfg: HeartbeatConfig) -> (HeartbeatScheduler, Arc<AtomicU64>) {
    let count = Arc::new(AtomicU64::new(0));
    let c = Arc::clone(&count);
    let sched = HeartbeatScheduler::new(
        cfg,
        Arc::new(handler_fn(move |_beat| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<(), PriceFeedError>(())
            }
        })),
    );
    (sched, count)
}

#[tokio::test(start_paused = true)]
async fn beats_fire_on_a_constant_cadence() {
    let (sched, count) = counting_scheduler(cadence(1));
    assert!(sched.start());
    assert!(sched.is_running());

    sleep(Duration::from_millis(3_500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 3);

    let stats = sched.stats();
    assert_eq!(stats.beats_executed, 3);
    assert_eq!(stats.beats_failed, 0);
    assert!(stats.start_time.is_some());
    assert!(stats.last_beat_time.is_some());

    assert_eq!(sched.stop().await, StopOutcome::Graceful);
    assert!(!sched.is_running());
}

#[tokio::test(start_paused = true)]
async fn handler_errors_are_counted_and_do_not_stop_the_loop() {
    let sched = HeartbeatScheduler::new(
        cadence(1),
        Arc::new(handler_fn(|beat| async move {
            if beat % 2 == 1 {
                Err(PriceFeedError::Other(format!("beat {beat} failed")))
            } else {
                Ok(())
            }
        })),
    );
    sched.start();
    sleep(Duration::from_millis(4_500)).await;

    let stats = sched.stats();
    assert_eq!(stats.beats_executed, 2);
    assert_eq!(stats.beats_failed, 2);
    sched.stop().await;
}

#[tokio::test(start_paused = true)]
async fn handler_panics_count_as_failed_beats() {
    let sched = HeartbeatScheduler::new(
        cadence(1),
        Arc::new(handler_fn(|beat| async move {
            assert!(beat != 1, "first beat blows up");
            Ok::<(), PriceFeedError>(())
        })),
    );
    sched.start();
    sleep(Duration::from_millis(2_500)).await;

    let stats = sched.stats();
    assert_eq!(stats.beats_failed, 1);
    assert_eq!(stats.beats_executed, 1);
    assert!(sched.is_running());
    sched.stop().await;
}

#[tokio::test(start_paused = true)]
async fn no_beat_starts_after_stop() {
    let (sched, count) = counting_scheduler(cadence(1));
    sched.start();
    sleep(Duration::from_millis(1_500)).await;
    assert_eq!(sched.stop().await, StopOutcome::Graceful);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_before_the_first_beat() {
    let (sched, count) = counting_scheduler(cadence(30));
    sched.start();
    assert_eq!(sched.stop().await, StopOutcome::Graceful);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_waits_for_an_in_flight_beat() {
    let sched = HeartbeatScheduler::new(
        cadence(1),
        Arc::new(handler_fn(|_beat| async {
            sleep(Duration::from_secs(2)).await;
            Ok::<(), PriceFeedError>(())
        })),
    );
    sched.start();
    sleep(Duration::from_millis(1_500)).await;

    assert_eq!(sched.stop().await, StopOutcome::Graceful);
    assert_eq!(sched.stats().beats_executed, 1);
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_a_hung_beat_after_the_timeout() {
    let sched = HeartbeatScheduler::new(
        cadence(1),
        Arc::new(handler_fn(|_beat| async {
            std::future::pending::<()>().await;
            Ok::<(), PriceFeedError>(())
        })),
    );
    sched.start();
    sleep(Duration::from_millis(1_500)).await;

    let t0 = Instant::now();
    assert_eq!(sched.stop().await, StopOutcome::Cancelled);
    assert!(t0.elapsed() >= Duration::from_secs(5));
    assert!(!sched.is_running());

    let stats = sched.stats();
    assert_eq!(stats.beats_executed + stats.beats_failed, 0);
}

#[tokio::test(start_paused = true)]
async fn start_and_stop_are_guarded() {
    let (sched, _count) = counting_scheduler(cadence(1));
    assert_eq!(sched.stop().await, StopOutcome::NotRunning);
    assert!(sched.start());
    assert!(!sched.start());
    assert_eq!(sched.stop().await, StopOutcome::Graceful);
    assert!(sched.start());
    sched.stop().await;
}

#[tokio::test(start_paused = true)]
async fn dropping_the_scheduler_ends_the_loop() {
    let (sched, count) = counting_scheduler(cadence(1));
    sched.start();
    sleep(Duration::from_millis(1_500)).await;
    drop(sched);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn effective_interval_adds_the_buffer() {
    let (sched, _count) = counting_scheduler(HeartbeatConfig::default());
    assert_eq!(sched.effective_interval(), Duration::from_secs(65));
    assert_eq!(sched.uptime_seconds(), 0);
}
