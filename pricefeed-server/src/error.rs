use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use pricefeed::PriceFeedError;

/// Error returned by every handler; renders as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// A failure from the price feed, mapped to a status by its class.
    Feed(PriceFeedError),
    /// Malformed request input caught before reaching the feed.
    BadRequest(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Feed(e) => match e {
                PriceFeedError::NotRegistered { .. } | PriceFeedError::NotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                PriceFeedError::AlreadyActive { .. }
                | PriceFeedError::InvalidArg(_)
                | PriceFeedError::BadSymbol(_) => StatusCode::BAD_REQUEST,
                PriceFeedError::Network { .. }
                | PriceFeedError::ExchangeUnavailable { .. }
                | PriceFeedError::RequestTimeout { .. }
                | PriceFeedError::Exchange { .. } => StatusCode::BAD_GATEWAY,
                PriceFeedError::Unsupported { .. } => StatusCode::NOT_IMPLEMENTED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feed(e) => write!(f, "{e}"),
            Self::BadRequest(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PriceFeedError> for ApiError {
    fn from(e: PriceFeedError) -> Self {
        Self::Feed(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
