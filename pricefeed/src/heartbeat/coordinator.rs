use std::sync::Arc;

use async_trait::async_trait;
use tracing::Instrument;

use pricefeed_core::{HeartbeatConfig, HeartbeatStats, PriceFeedError, PriceFetchReport};

use super::scheduler::{BeatHandler, HeartbeatScheduler, StopOutcome};
use crate::core::PriceFeed;

/// Beat handler that captures live prices for every active symbol.
///
/// Failures are logged and swallowed so a bad beat never counts against the
/// scheduler; per-symbol failures are logged one by one.
struct CaptureOnBeat {
    feed: Arc<PriceFeed>,
}

#[async_trait]
impl BeatHandler for CaptureOnBeat {
    async fn on_beat(&self, beat: u64) -> Result<(), PriceFeedError> {
        tracing::info!(beat, "beat started");
        match self.feed.fetch_all_prices().await {
            Ok(reports) if reports.is_empty() => {
                tracing::info!(beat, "no symbols registered");
            }
            Ok(reports) => {
                let ok = reports.iter().filter(|r| r.is_success()).count();
                tracing::info!(beat, ok, total = reports.len(), "beat complete");
                for r in reports.iter().filter(|r| !r.is_success()) {
                    if let Some(e) = &r.error {
                        tracing::warn!(beat, symbol = %r.symbol, error = %e, "price capture failed");
                    }
                }
            }
            Err(e) => tracing::error!(beat, error = %e, "beat failed"),
        }
        Ok(())
    }
}

/// Wires a [`HeartbeatScheduler`] to live price capture on a [`PriceFeed`].
pub struct HeartbeatCoordinator {
    feed: Arc<PriceFeed>,
    scheduler: HeartbeatScheduler,
    span: tracing::Span,
}

impl HeartbeatCoordinator {
    /// Coordinator using the feed's heartbeat configuration.
    #[must_use]
    pub fn new(feed: Arc<PriceFeed>) -> Self {
        let cfg = feed.config().heartbeat;
        Self::with_config(feed, cfg)
    }

    /// Coordinator with an explicit cadence.
    #[must_use]
    pub fn with_config(feed: Arc<PriceFeed>, cfg: HeartbeatConfig) -> Self {
        let span = tracing::info_span!(parent: feed.span(), "heartbeat");
        let handler = Arc::new(CaptureOnBeat {
            feed: Arc::clone(&feed),
        });
        let scheduler = HeartbeatScheduler::new(cfg, handler).with_span(span.clone());
        Self {
            feed,
            scheduler,
            span,
        }
    }

    /// Start periodic capture. Returns false if already running.
    pub fn start(&self) -> bool {
        let started = self.scheduler.start();
        if started {
            tracing::info!(
                parent: &self.span,
                effective_interval_secs = self.scheduler.effective_interval().as_secs(),
                "heartbeat coordinator started"
            );
        }
        started
    }

    /// Stop periodic capture, waiting for an in-flight beat up to the stop timeout.
    pub async fn stop(&self) -> StopOutcome {
        let outcome = self.scheduler.stop().await;
        if outcome != StopOutcome::NotRunning {
            let stats = self.scheduler.stats();
            tracing::info!(
                parent: &self.span,
                executed = stats.beats_executed,
                failed = stats.beats_failed,
                ?outcome,
                "heartbeat coordinator stopped"
            );
        }
        outcome
    }

    /// Capture prices once, outside the schedule.
    ///
    /// # Errors
    /// Fails only when the active symbols cannot be listed.
    pub async fn run_once(&self) -> Result<Vec<PriceFetchReport>, PriceFeedError> {
        self.feed
            .fetch_all_prices()
            .instrument(self.span.clone())
            .await
    }

    /// Whether the schedule is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Snapshot of the beat counters.
    #[must_use]
    pub fn stats(&self) -> HeartbeatStats {
        self.scheduler.stats()
    }

    /// The underlying scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &HeartbeatScheduler {
        &self.scheduler
    }
}
