use std::time::Duration;

use pricefeed_core::PriceFeedError;
use url::Url;

use crate::BinanceConnector;

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Builder for [`BinanceConnector`].
pub struct BinanceConnectorBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl Default for BinanceConnectorBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("pricefeed/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl BinanceConnectorBuilder {
    /// Point the connector at another host, e.g. a testnet or a local stub.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Per-request timeout.
    ///
    /// Behavior and trade-offs:
    /// - Requests exceeding it fail with `RequestTimeout`, which the retry
    ///   policy treats as transient.
    /// - Short values fail fast during outages but may cut off slow kline pages.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Build the connector.
    ///
    /// # Errors
    /// - `InvalidConfig` if the base URL does not parse or is not http(s).
    /// - `InvalidConfig` if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<BinanceConnector, PriceFeedError> {
        let base = Url::parse(&self.base_url).map_err(|e| {
            PriceFeedError::InvalidConfig(format!("binance base url {:?}: {e}", self.base_url))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(PriceFeedError::InvalidConfig(format!(
                "binance base url must be http(s): {base}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|e| PriceFeedError::InvalidConfig(format!("http client: {e}")))?;
        Ok(BinanceConnector { http, base })
    }
}
