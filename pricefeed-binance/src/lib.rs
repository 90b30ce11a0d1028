//! pricefeed-binance
//!
//! Connector for Binance spot market data over the public REST API. Provides
//! live tickers (`/api/v3/ticker/24hr`) and one-minute klines
//! (`/api/v3/klines`); no API key is needed.
//!
//! Pairs are addressed in the unified `BASE/QUOTE` form (`BTC/USDT`) and
//! mapped to Binance market ids (`BTCUSDT`) on the wire.
//!
//! Errors are classified for the retry policy: timeouts, connection
//! failures, 5xx and rate-limit responses are transient; an unknown market
//! id is `BadSymbol`; any other rejection is a permanent `Exchange` error.
#![warn(missing_docs)]

mod builder;
pub mod market;
mod wire;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use pricefeed_core::{
    Candle, ExchangeConnector, MINUTE_MS, OhlcvProvider, PriceFeedError, Ticker, TickerProvider,
};

pub use builder::{BinanceConnectorBuilder, DEFAULT_BASE_URL};
use market::to_market_id;
use wire::{ApiError, INVALID_SYMBOL, Ticker24h, parse_klines};

/// Largest page `/api/v3/klines` serves in one request; longer fetches are paged.
pub const MAX_KLINES_PER_REQUEST: u32 = 1000;

/// Binance spot connector.
pub struct BinanceConnector {
    http: reqwest::Client,
    base: Url,
}

impl BinanceConnector {
    /// Connector name used in logs and errors.
    pub const NAME: &'static str = "binance";

    /// Builder with the production endpoint and a 10 s timeout.
    #[must_use]
    pub fn builder() -> BinanceConnectorBuilder {
        BinanceConnectorBuilder::default()
    }

    /// Connector against the production endpoint.
    ///
    /// # Errors
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, PriceFeedError> {
        Self::builder().build()
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, PriceFeedError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| PriceFeedError::InvalidConfig(format!("endpoint {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET `url` and return the body of a 2xx response.
    ///
    /// `subject` names the pair for `BadSymbol` errors.
    async fn get(&self, url: Url, operation: &str, subject: &str) -> Result<String, PriceFeedError> {
        tracing::debug!(%url, operation, "binance request");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(&e, operation))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| classify_transport(&e, operation))?;
        if status.is_success() {
            return Ok(body);
        }
        let err = classify_status(status, &body, subject);
        tracing::warn!(operation, %status, error = %err, "binance request rejected");
        Err(err)
    }

    async fn fetch_ticker_batch(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Ticker>, PriceFeedError> {
        let ids: Vec<String> = symbols.iter().map(|s| to_market_id(s)).collect();
        let encoded = serde_json::to_string(&ids)
            .map_err(|e| PriceFeedError::Data(format!("ticker batch: {e}")))?;
        let url = self.endpoint("/api/v3/ticker/24hr", &[("symbols", encoded.as_str())])?;
        let body = self.get(url, "tickers", &symbols.join(",")).await?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&body)
            .map_err(|e| PriceFeedError::Data(format!("tickers: {e}")))?;

        let by_id: HashMap<String, &String> = ids.into_iter().zip(symbols).collect();
        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let id = row.get("symbol").and_then(serde_json::Value::as_str);
            let Some(pair) = id.and_then(|id| by_id.get(id)).map(|p| (*p).clone()) else {
                continue;
            };
            let parsed = serde_json::from_value::<Ticker24h>(row)
                .map_err(|e| PriceFeedError::Data(format!("ticker {pair}: {e}")))
                .and_then(|t| t.into_ticker(Some(&pair)));
            match parsed {
                Ok(ticker) => {
                    out.insert(pair, ticker);
                }
                Err(e) => {
                    tracing::warn!(symbol = %pair, error = %e, "malformed ticker row skipped");
                }
            }
        }
        Ok(out)
    }
}

fn classify_transport(e: &reqwest::Error, operation: &str) -> PriceFeedError {
    if e.is_timeout() {
        PriceFeedError::request_timeout(BinanceConnector::NAME, operation)
    } else if e.is_connect() || e.is_request() || e.is_body() {
        PriceFeedError::network(BinanceConnector::NAME, e.to_string())
    } else if e.is_decode() {
        PriceFeedError::Data(format!("{operation}: {e}"))
    } else {
        PriceFeedError::exchange(BinanceConnector::NAME, e.to_string())
    }
}

fn classify_status(status: StatusCode, body: &str, subject: &str) -> PriceFeedError {
    let api: Option<ApiError> = serde_json::from_str(body).ok();
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        // 418: IP banned after ignoring 429s; clears on its own
        || status.as_u16() == 418
    {
        let msg = api.map_or_else(|| status.to_string(), |a| a.msg);
        return PriceFeedError::unavailable(BinanceConnector::NAME, msg);
    }
    match api {
        Some(a) if a.code == INVALID_SYMBOL => PriceFeedError::BadSymbol(subject.to_string()),
        Some(a) => PriceFeedError::exchange(
            BinanceConnector::NAME,
            format!("{status} (code {}): {}", a.code, a.msg),
        ),
        None => PriceFeedError::exchange(BinanceConnector::NAME, status.to_string()),
    }
}

impl ExchangeConnector for BinanceConnector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn as_ticker_provider(&self) -> Option<&dyn TickerProvider> {
        Some(self as &dyn TickerProvider)
    }

    fn as_ohlcv_provider(&self) -> Option<&dyn OhlcvProvider> {
        Some(self as &dyn OhlcvProvider)
    }
}

#[async_trait]
impl TickerProvider for BinanceConnector {
    async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, PriceFeedError> {
        let id = to_market_id(symbol);
        let url = self.endpoint("/api/v3/ticker/24hr", &[("symbol", id.as_str())])?;
        let body = self.get(url, "ticker", symbol).await?;
        let raw: Ticker24h = serde_json::from_str(&body)
            .map_err(|e| PriceFeedError::Data(format!("ticker {symbol}: {e}")))?;
        raw.into_ticker(Some(symbol))
    }

    /// One batch request for all pairs.
    ///
    /// Binance rejects the whole batch when any id is unknown; in that case
    /// the pairs are fetched one by one so the valid ones still come back.
    /// A row that fails to parse is logged and left out of the map.
    async fn fetch_tickers(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Ticker>, PriceFeedError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        match self.fetch_ticker_batch(symbols).await {
            Err(PriceFeedError::BadSymbol(_)) => {
                tracing::warn!(
                    count = symbols.len(),
                    "batch ticker request rejected an unknown symbol; fetching individually"
                );
                let mut out = HashMap::with_capacity(symbols.len());
                for symbol in symbols {
                    match self.fetch_ticker(symbol).await {
                        Ok(t) => {
                            out.insert(symbol.clone(), t);
                        }
                        Err(e) if e.is_retryable() => return Err(e),
                        Err(e) => tracing::warn!(symbol, error = %e, "ticker skipped"),
                    }
                }
                Ok(out)
            }
            other => other,
        }
    }
}

#[async_trait]
impl OhlcvProvider for BinanceConnector {
    /// Klines from `since_ms`, paged in requests of at most
    /// [`MAX_KLINES_PER_REQUEST`] until `limit` candles arrive or a page
    /// comes back short.
    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        since_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceFeedError> {
        let mut remaining = limit.max(1);
        let mut cursor = since_ms;
        let mut out = Vec::new();
        while remaining > 0 {
            let page = remaining.min(MAX_KLINES_PER_REQUEST);
            let candles = self.fetch_klines_page(symbol, cursor, page).await?;
            let got = u32::try_from(candles.len()).unwrap_or(u32::MAX);
            if let Some(last) = candles.last() {
                cursor = last.timestamp + MINUTE_MS;
            }
            out.extend(candles);
            if got < page {
                break;
            }
            remaining -= page;
        }
        tracing::debug!(symbol, since_ms, limit, returned = out.len(), "klines fetched");
        Ok(out)
    }
}

impl BinanceConnector {
    async fn fetch_klines_page(
        &self,
        symbol: &str,
        since_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>, PriceFeedError> {
        let id = to_market_id(symbol);
        let since = since_ms.to_string();
        let limit_s = limit.to_string();
        let url = self.endpoint(
            "/api/v3/klines",
            &[
                ("symbol", id.as_str()),
                ("interval", "1m"),
                ("startTime", since.as_str()),
                ("limit", limit_s.as_str()),
            ],
        )?;
        let body = self.get(url, "ohlcv", symbol).await?;
        parse_klines(&body)
    }
}
