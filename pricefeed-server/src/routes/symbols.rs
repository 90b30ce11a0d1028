use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use pricefeed::PriceFeedError;

use super::views::{Registration, RegistrationStatus, ReportView, SymbolList, SymbolView};
use crate::error::ApiError;
use crate::state::AppState;

/// Shortest accepted pair name, e.g. `A/B`.
const MIN_SYMBOL_LEN: usize = 3;

#[derive(Debug, Deserialize)]
pub struct SymbolCreate {
    symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_active_only")]
    active_only: bool,
}

const fn default_active_only() -> bool {
    true
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/symbols", get(list_symbols).post(create_symbol))
        .route("/symbols/*symbol", get(get_symbol).delete(delete_symbol))
}

// Wildcard captures keep pairs like `BTC/USDT` intact.
fn pair(raw: &str) -> &str {
    raw.trim_start_matches('/')
}

async fn create_symbol(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SymbolCreate>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    let name = body.symbol.trim();
    if name.chars().count() < MIN_SYMBOL_LEN {
        return Err(ApiError::BadRequest(format!(
            "symbol must be at least {MIN_SYMBOL_LEN} characters"
        )));
    }
    let feed = &state.feed;
    let symbol = feed.registry().register(name).await?;

    let (result, error) = match feed.backfill_symbol(&symbol.symbol, None).await {
        Ok(report) => (Some(report), None),
        Err(e) => {
            tracing::warn!(symbol = %symbol.symbol, error = %e, "registration backfill failed");
            (None, Some(e.to_string()))
        }
    };
    let history = feed.backfill_status(&symbol.symbol).await?;

    let mut message = format!("Symbol '{}' registered successfully", symbol.symbol);
    if let Some(e) = &error {
        message.push_str(&format!(" but backfill failed: {e}"));
    } else if let Some(r) = result.as_ref().filter(|r| r.records_stored > 0) {
        message.push_str(&format!(" with {} historical records", r.records_stored));
    }

    Ok((
        StatusCode::CREATED,
        Json(Registration {
            symbol: SymbolView::from(&symbol),
            backfill_status: RegistrationStatus {
                history,
                backfill_result: result.map(ReportView::from),
                backfill_error: error,
            },
            message,
        }),
    ))
}

async fn list_symbols(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> Result<Json<SymbolList>, ApiError> {
    let rows = if q.active_only {
        state.feed.registry().list_active().await?
    } else {
        state.feed.registry().list_all().await?
    };
    let symbols: Vec<SymbolView> = rows.iter().map(SymbolView::from).collect();
    Ok(Json(SymbolList {
        count: symbols.len(),
        symbols,
    }))
}

async fn get_symbol(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<SymbolView>, ApiError> {
    let name = pair(&raw);
    let symbol = state
        .feed
        .registry()
        .get_by_name(name)
        .await?
        .ok_or_else(|| PriceFeedError::not_found(format!("symbol '{name}'")))?;
    Ok(Json(SymbolView::from(&symbol)))
}

async fn delete_symbol(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = pair(&raw);
    let registry = state.feed.registry();
    let symbol = registry
        .get_by_name(name)
        .await?
        .ok_or_else(|| PriceFeedError::not_found(format!("symbol '{name}'")))?;
    registry.deactivate(symbol.id).await?;
    let after = registry
        .get(symbol.id)
        .await?
        .ok_or_else(|| PriceFeedError::not_found(format!("symbol id {}", symbol.id)))?;
    Ok(Json(serde_json::json!({
        "symbol": SymbolView::from(&after),
        "message": format!("Symbol '{name}' deactivated"),
    })))
}
