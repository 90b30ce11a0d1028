//! pricefeed-server
//!
//! REST surface over a [`pricefeed::PriceFeed`]: symbol registration with an
//! automatic backfill, history queries and on-demand gap-fill sweeps. The
//! binary wires it to SQLite, Binance and the heartbeat coordinator.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

/// Full application router with CORS and request tracing.
pub fn app(state: Arc<AppState>) -> Router {
    routes::api_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
