use std::sync::Arc;

use chrono::{DateTime, Utc};
use pricefeed::PriceFeed;

/// Shared application state, handed to every route via `axum::extract::State`.
pub struct AppState {
    pub feed: Arc<PriceFeed>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(feed: Arc<PriceFeed>) -> Arc<Self> {
        Arc::new(Self {
            feed,
            started_at: Utc::now(),
        })
    }
}
