use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use pricefeed_core::{HeartbeatConfig, HeartbeatStats, PriceFeedError};

/// Work performed on every beat.
#[async_trait]
pub trait BeatHandler: Send + Sync {
    /// Handle beat number `beat` (1-based, counted since the last start).
    async fn on_beat(&self, beat: u64) -> Result<(), PriceFeedError>;
}

/// A [`BeatHandler`] backed by an async closure. See [`handler_fn`].
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a [`BeatHandler`].
pub const fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(u64) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), PriceFeedError>> + Send,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> BeatHandler for HandlerFn<F>
where
    F: Fn(u64) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), PriceFeedError>> + Send,
{
    async fn on_beat(&self, beat: u64) -> Result<(), PriceFeedError> {
        (self.f)(beat).await
    }
}

/// How a call to [`HeartbeatScheduler::stop`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The scheduler was not running.
    NotRunning,
    /// The loop exited on its own within the stop timeout.
    Graceful,
    /// The in-flight beat outlived the stop timeout and the task was aborted.
    Cancelled,
}

/// Delay until the next beat: the end of the current interval cycle plus `buffer_secs`.
///
/// Cycles are aligned to the UNIX epoch, so a 60 s interval fires just after
/// every wall-clock minute boundary. An interval of zero degenerates to a
/// constant `buffer_secs` delay.
#[must_use]
pub fn next_beat_delay(interval_secs: u64, buffer_secs: u64, now: DateTime<Utc>) -> Duration {
    let buffer = Duration::from_secs(buffer_secs);
    if interval_secs == 0 {
        return buffer;
    }
    let cycle_ms = i64::try_from(interval_secs.saturating_mul(1_000)).unwrap_or(i64::MAX);
    let into_cycle = now.timestamp_millis().rem_euclid(cycle_ms);
    let until_boundary = u64::try_from(cycle_ms - into_cycle).unwrap_or(0);
    Duration::from_millis(until_boundary) + buffer
}

struct Running {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// Fires a [`BeatHandler`] on a cadence aligned to interval boundaries.
///
/// Behavior and trade-offs:
/// - Handler errors and panics are logged and counted as failed beats; they
///   never end the loop.
/// - `stop` lets an in-flight beat finish up to `stop_timeout`, then aborts
///   the task. No new beat starts once stop was requested.
/// - Dropping the scheduler aborts a running loop without waiting.
pub struct HeartbeatScheduler {
    cfg: HeartbeatConfig,
    handler: Arc<dyn BeatHandler>,
    stats: Arc<Mutex<HeartbeatStats>>,
    running: Mutex<Option<Running>>,
    span: tracing::Span,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HeartbeatScheduler {
    /// Create a stopped scheduler.
    #[must_use]
    pub fn new(cfg: HeartbeatConfig, handler: Arc<dyn BeatHandler>) -> Self {
        Self {
            cfg,
            handler,
            stats: Arc::new(Mutex::new(HeartbeatStats::default())),
            running: Mutex::new(None),
            span: tracing::info_span!("heartbeat"),
        }
    }

    /// Attach a tracing span that parents the loop's events.
    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Start the beat loop on the current Tokio runtime.
    ///
    /// Returns false, with a warning, if the loop is already running.
    pub fn start(&self) -> bool {
        let mut running = lock(&self.running);
        if running.as_ref().is_some_and(|r| !r.join.is_finished()) {
            tracing::warn!(parent: &self.span, "heartbeat scheduler already running");
            return false;
        }
        lock(&self.stats).start_time = Some(Utc::now());

        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(
            run_loop(
                self.cfg,
                Arc::clone(&self.handler),
                Arc::clone(&self.stats),
                stop_rx,
            )
            .instrument(self.span.clone()),
        );
        *running = Some(Running { stop_tx, join });
        tracing::info!(
            parent: &self.span,
            interval_secs = self.cfg.interval_secs,
            buffer_secs = self.cfg.buffer_delay_secs,
            "heartbeat scheduler started"
        );
        true
    }

    /// Request a stop and wait for the loop to exit, bounded by `stop_timeout`.
    pub async fn stop(&self) -> StopOutcome {
        let running = lock(&self.running).take();
        let Some(Running { stop_tx, mut join }) = running else {
            return StopOutcome::NotRunning;
        };
        let _ = stop_tx.send(true);

        let outcome = if tokio::time::timeout(self.cfg.stop_timeout, &mut join)
            .await
            .is_ok()
        {
            StopOutcome::Graceful
        } else {
            tracing::warn!(
                parent: &self.span,
                timeout_ms = u64::try_from(self.cfg.stop_timeout.as_millis()).unwrap_or(u64::MAX),
                "beat did not finish in time; cancelling"
            );
            join.abort();
            let _ = join.await;
            StopOutcome::Cancelled
        };

        let stats = self.stats();
        tracing::info!(
            parent: &self.span,
            executed = stats.beats_executed,
            failed = stats.beats_failed,
            uptime_secs = stats.uptime_seconds(Utc::now()),
            "heartbeat scheduler stopped"
        );
        outcome
    }

    /// Whether the beat loop is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.running)
            .as_ref()
            .is_some_and(|r| !r.join.is_finished())
    }

    /// Snapshot of the beat counters.
    #[must_use]
    pub fn stats(&self) -> HeartbeatStats {
        *lock(&self.stats)
    }

    /// Seconds since the last start, or 0 if never started.
    #[must_use]
    pub fn uptime_seconds(&self) -> i64 {
        self.stats().uptime_seconds(Utc::now())
    }

    /// Nominal time between beats: interval plus buffer.
    #[must_use]
    pub const fn effective_interval(&self) -> Duration {
        Duration::from_secs(self.cfg.interval_secs + self.cfg.buffer_delay_secs)
    }

    /// The cadence configuration.
    #[must_use]
    pub const fn config(&self) -> &HeartbeatConfig {
        &self.cfg
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        if let Some(r) = lock(&self.running).take() {
            r.join.abort();
        }
    }
}

/// Wait `delay` unless a stop is requested first. Returns true on stop.
async fn wait_or_stop(delay: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    if *stop.borrow() {
        return true;
    }
    if delay.is_zero() {
        tokio::task::yield_now().await;
        return *stop.borrow();
    }
    tokio::select! {
        () = tokio::time::sleep(delay) => *stop.borrow(),
        changed = stop.changed() => changed.is_err() || *stop.borrow(),
    }
}

async fn run_loop(
    cfg: HeartbeatConfig,
    handler: Arc<dyn BeatHandler>,
    stats: Arc<Mutex<HeartbeatStats>>,
    mut stop: watch::Receiver<bool>,
) {
    let initial = next_beat_delay(cfg.interval_secs, cfg.buffer_delay_secs, Utc::now());
    tracing::debug!(
        delay_ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX),
        "waiting for first beat"
    );
    if wait_or_stop(initial, &mut stop).await {
        return;
    }

    let mut beat = 0u64;
    loop {
        beat += 1;
        let started = Utc::now();
        let outcome = AssertUnwindSafe(handler.on_beat(beat)).catch_unwind().await;
        {
            let mut s = lock(&stats);
            match &outcome {
                Ok(Ok(())) => {
                    s.beats_executed += 1;
                    s.last_beat_time = Some(started);
                }
                Ok(Err(_)) | Err(_) => s.beats_failed += 1,
            }
        }
        match outcome {
            Ok(Ok(())) => tracing::debug!(beat, "beat completed"),
            Ok(Err(e)) => tracing::warn!(beat, error = %e, "beat handler failed"),
            Err(_) => tracing::error!(beat, "beat handler panicked"),
        }

        let delay = next_beat_delay(cfg.interval_secs, cfg.buffer_delay_secs, Utc::now());
        if wait_or_stop(delay, &mut stop).await {
            break;
        }
    }
}
