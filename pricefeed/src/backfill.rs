use futures::stream::{self, StreamExt};
use tracing::Instrument;

use pricefeed_core::{
    BackfillReport, BackfillStatus, HistoryStatus, PriceFeedError, PricePoint, floor_to_minute,
};

use crate::core::PriceFeed;
use crate::planner::FetchPlan;

impl PriceFeed {
    /// Backfill recent history for one registered symbol.
    ///
    /// `minutes` overrides the configured `backfill_minutes` for this call.
    ///
    /// Behavior and trade-offs:
    /// - Unregistered symbols fail before any exchange call or write.
    /// - When stored history already covers the window the exchange is not
    ///   called and a `no_action` report is returned.
    /// - Candles are requested as `limit + 1` so the forming minute does not
    ///   push the last closed minute out of the response.
    /// - Timestamps are floored to the minute before a single batch upsert.
    ///
    /// # Errors
    /// - `InvalidArg` if `minutes` is zero.
    /// - `NotRegistered` if the symbol has never been registered.
    /// - `Unsupported` if the connector cannot serve candles.
    /// - Exchange errors after the retry policy gives up, and store failures.
    pub async fn backfill_symbol(
        &self,
        symbol: &str,
        minutes: Option<u32>,
    ) -> Result<BackfillReport, PriceFeedError> {
        self.backfill_symbol_inner(symbol, minutes)
            .instrument(self.span.clone())
            .await
    }

    async fn backfill_symbol_inner(
        &self,
        symbol: &str,
        minutes: Option<u32>,
    ) -> Result<BackfillReport, PriceFeedError> {
        let desired = minutes.unwrap_or(self.cfg.backfill.backfill_minutes);
        if desired == 0 {
            return Err(PriceFeedError::InvalidArg(
                "backfill minutes must be at least 1".into(),
            ));
        }
        let sym = self.registry.require(symbol).await?;
        let symbol = sym.symbol.as_str();

        let plan = self
            .planner
            .plan_for(self.prices.as_ref(), sym.id, desired, self.exchange.now_ms())
            .await?;
        let window = match plan {
            FetchPlan::Skip { reason } => {
                tracing::info!(symbol, reason, "backfill skipped");
                return Ok(BackfillReport::no_action(symbol, reason));
            }
            FetchPlan::Fetch(w) => w,
        };

        let ohlcv = self
            .exchange
            .as_ohlcv_provider()
            .ok_or_else(|| PriceFeedError::unsupported("ohlcv"))?;

        tracing::info!(
            symbol,
            strategy = %window.strategy,
            from_ms = window.since_ms,
            to_ms = window.until_ms,
            limit = window.limit,
            "starting backfill"
        );

        let request_limit = window.limit.saturating_add(1);
        let candles = self
            .retry
            .run("fetch_ohlcv", || {
                ohlcv.fetch_ohlcv(symbol, window.since_ms, request_limit)
            })
            .await?;

        if candles.is_empty() {
            tracing::warn!(symbol, strategy = %window.strategy, "no candles returned");
            return Ok(BackfillReport::no_data(symbol, window.strategy));
        }

        let points: Vec<PricePoint> = candles
            .iter()
            .map(|c| {
                let mut p = PricePoint::from_candle(sym.id, c);
                p.timestamp = floor_to_minute(c.timestamp);
                p
            })
            .collect();
        let stored = self.prices.upsert_many(&points).await?;
        tracing::info!(symbol, fetched = candles.len(), stored, "backfill stored");

        Ok(BackfillReport::success(
            symbol,
            window.strategy,
            stored,
            window.since_ms,
            window.until_ms,
        ))
    }

    /// Backfill every active symbol.
    ///
    /// Behavior and trade-offs:
    /// - A failure on one symbol becomes an `Error` entry; the sweep continues.
    /// - Symbols are processed `backfill.concurrency` at a time (sequentially by
    ///   default) and reports come back in registry order.
    ///
    /// # Errors
    /// Only a failure to list the active symbols aborts the sweep.
    pub async fn backfill_all_symbols(&self) -> Result<Vec<BackfillReport>, PriceFeedError> {
        let symbols = self.registry.list_active().await?;
        if symbols.is_empty() {
            tracing::info!(parent: &self.span, "no active symbols to backfill");
            return Ok(Vec::new());
        }
        tracing::info!(parent: &self.span, count = symbols.len(), "starting gap-fill backfill");

        let concurrency = self.cfg.backfill.concurrency.max(1);
        let reports: Vec<BackfillReport> = stream::iter(symbols.iter().cloned())
            .map(|s| async move {
                match self.backfill_symbol(&s.symbol, None).await {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::error!(parent: &self.span, symbol = %s.symbol, error = %e, "backfill failed");
                        BackfillReport::failed(s.symbol.clone(), e)
                    }
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let success = count_status(&reports, BackfillStatus::Success);
        let no_action = count_status(&reports, BackfillStatus::NoAction);
        let errors = reports.len() - success - no_action;
        let records: usize = reports.iter().map(|r| r.records_stored).sum();
        tracing::info!(
            parent: &self.span,
            success,
            no_action,
            errors,
            records,
            "backfill complete"
        );
        Ok(reports)
    }

    /// Stored-history summary for a registered symbol.
    ///
    /// # Errors
    /// Returns `NotRegistered` for unknown symbols and propagates store failures.
    pub async fn backfill_status(&self, symbol: &str) -> Result<HistoryStatus, PriceFeedError> {
        let sym = self.registry.require(symbol).await?;
        let total_records = self.prices.count(sym.id).await?;
        let latest = self.prices.latest(sym.id).await?;
        let oldest = self.prices.oldest(sym.id).await?;
        Ok(HistoryStatus {
            symbol: sym.symbol,
            symbol_id: sym.id,
            registered_at: sym.created_at,
            total_records,
            latest_timestamp: latest.map(|p| p.timestamp),
            latest_price: latest.map(|p| p.close),
            oldest_timestamp: oldest.map(|p| p.timestamp),
        })
    }
}

fn count_status(reports: &[BackfillReport], status: BackfillStatus) -> usize {
    reports.iter().filter(|r| r.status == status).count()
}
