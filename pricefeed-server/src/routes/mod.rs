mod prices;
mod symbols;
mod system;
pub mod views;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Assemble the API router.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(system::routes())
        .merge(symbols::routes())
        .merge(prices::routes())
}
