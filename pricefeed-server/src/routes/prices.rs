use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use pricefeed::{ExchangeConnector, HistoryStatus, PriceFeedError, PriceStore};

use super::views::{PriceSeries, PriceView, ReportView, SweepSummary};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    symbol: String,
    /// Inclusive lower bound in epoch ms; defaults to the epoch.
    #[serde(default)]
    start: Option<i64>,
    /// Inclusive upper bound in epoch ms; defaults to the exchange clock.
    #[serde(default)]
    end: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    symbol: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/prices", get(price_range))
        .route("/backfill/status", get(backfill_status))
        .route("/backfill/all", post(backfill_all))
}

async fn price_range(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<PriceSeries>, ApiError> {
    let feed = &state.feed;
    let end = q.end.unwrap_or_else(|| feed.exchange().now_ms());
    let start = q.start.unwrap_or(0);
    if start > end {
        return Err(PriceFeedError::InvalidArg(format!("start {start} is after end {end}")).into());
    }
    let symbol = feed.registry().require(q.symbol.trim()).await?;
    let points = feed.prices().range(symbol.id, start, end).await?;
    Ok(Json(PriceSeries {
        symbol: symbol.symbol,
        start,
        end,
        count: points.len(),
        prices: points.iter().map(PriceView::from).collect(),
    }))
}

async fn backfill_status(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolQuery>,
) -> Result<Json<HistoryStatus>, ApiError> {
    Ok(Json(state.feed.backfill_status(q.symbol.trim()).await?))
}

async fn backfill_all(State(state): State<Arc<AppState>>) -> Result<Json<SweepSummary>, ApiError> {
    let reports = state.feed.backfill_all_symbols().await?;
    let records_stored = reports.iter().map(|r| r.records_stored).sum();
    let results: Vec<ReportView> = reports.into_iter().map(ReportView::from).collect();
    Ok(Json(SweepSummary {
        count: results.len(),
        records_stored,
        results,
    }))
}
