//! pricefeed-core
//!
//! Contracts and small utilities shared across the pricefeed ecosystem.
//!
//! - `connector`: the `ExchangeConnector` trait and its ticker/candle role traits.
//! - `store`: the `PriceStore` and `SymbolStore` contracts plus an in-memory implementation.
//! - `time`: minute-alignment helpers.
//! - `retry`: the exponential backoff policy applied around exchange calls.
//!
//! Async runtime (Tokio)
//! ---------------------
//! Retry sleeps use `tokio::time` and the in-memory store uses `tokio::sync`
//! locks, so callers must run under a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Exchange connector capability traits.
pub mod connector;
/// Retry policy for transient exchange failures.
pub mod retry;
/// Storage contracts and the in-memory backend.
pub mod store;
/// Minute-granularity time helpers.
pub mod time;

pub use connector::{ExchangeConnector, OhlcvProvider, TickerProvider};
pub use retry::RetryPolicy;
pub use store::memory::InMemoryStore;
pub use store::{PriceStore, SymbolStore, check_point};
pub use time::{MINUTE_MS, floor_to_minute, is_minute_aligned, last_closed_minute};

pub use pricefeed_types::*;
