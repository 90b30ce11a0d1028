use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the pricefeed workspace.
///
/// This covers registration problems, exchange failures (split into transient
/// and permanent classes), storage failures, argument and configuration
/// validation, and not-found conditions.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PriceFeedError {
    /// The symbol has no active registration.
    #[error("Symbol '{symbol}' is not registered. Register it first.")]
    NotRegistered {
        /// Exchange pair, e.g. "BTC/USDT".
        symbol: String,
    },

    /// The symbol is already registered and active.
    #[error("Symbol '{symbol}' is already registered and active")]
    AlreadyActive {
        /// Exchange pair, e.g. "BTC/USDT".
        symbol: String,
    },

    /// Transport-level failure talking to the exchange (connect, reset, DNS).
    #[error("network error via {exchange}: {msg}")]
    Network {
        /// Exchange connector name.
        exchange: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The exchange answered but is temporarily unavailable (5xx, maintenance, throttling).
    #[error("exchange not available: {exchange}: {msg}")]
    ExchangeUnavailable {
        /// Exchange connector name.
        exchange: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A request to the exchange exceeded its timeout.
    #[error("request timed out: {operation} via {exchange}")]
    RequestTimeout {
        /// Exchange connector name.
        exchange: String,
        /// Operation label (e.g. "ohlcv", "tickers").
        operation: String,
    },

    /// The exchange does not know the requested symbol.
    #[error("bad symbol: {0}")]
    BadSymbol(String),

    /// Any other exchange-reported failure.
    #[error("{exchange} failed: {msg}")]
    Exchange {
        /// Exchange connector name.
        exchange: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The connector does not implement the requested capability.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// Capability label, e.g. "ohlcv".
        capability: String,
    },

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Issues with returned or expected data (malformed payloads, unaligned timestamps).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A resource could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource, e.g. "symbol id 7".
        what: String,
    },

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl PriceFeedError {
    /// Helper: build a `NotRegistered` error.
    pub fn not_registered(symbol: impl Into<String>) -> Self {
        Self::NotRegistered {
            symbol: symbol.into(),
        }
    }

    /// Helper: build an `AlreadyActive` error.
    pub fn already_active(symbol: impl Into<String>) -> Self {
        Self::AlreadyActive {
            symbol: symbol.into(),
        }
    }

    /// Helper: build a `Network` error tagged with the exchange name.
    pub fn network(exchange: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Network {
            exchange: exchange.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build an `ExchangeUnavailable` error.
    pub fn unavailable(exchange: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ExchangeUnavailable {
            exchange: exchange.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `RequestTimeout` error.
    pub fn request_timeout(exchange: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::RequestTimeout {
            exchange: exchange.into(),
            operation: operation.into(),
        }
    }

    /// Helper: build an `Exchange` error with the exchange name and message.
    pub fn exchange(exchange: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Exchange {
            exchange: exchange.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build an `Unsupported` error for a capability label.
    #[must_use]
    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: capability.into(),
        }
    }

    /// Helper: build a `Storage` error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Returns true if the failure is transient and the call may be retried.
    ///
    /// Only transport failures, exchange unavailability and timeouts qualify.
    /// Everything else, including registration and validation errors, is
    /// surfaced to the caller immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::ExchangeUnavailable { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns true if this error should be surfaced to users as actionable.
    ///
    /// Capability absence and missing resources are benign; everything else
    /// needs attention.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        !matches!(self, Self::Unsupported { .. } | Self::NotFound { .. })
    }
}
