//! Response payloads of the Binance spot REST API.
//!
//! Binance encodes prices and volumes as decimal strings; they are parsed
//! into `f64` here so malformed values surface as `Data` errors.

use serde::Deserialize;
use serde_json::Value;

use pricefeed_core::{Candle, PriceFeedError, Ticker};

use crate::market::from_market_id;

/// Error body returned with 4xx responses, e.g. `{"code":-1121,"msg":"Invalid symbol."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub code: i64,
    pub msg: String,
}

/// Binance error code for an unknown market id.
pub(crate) const INVALID_SYMBOL: i64 = -1121;

/// One entry of `/api/v3/ticker/24hr`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Ticker24h {
    pub symbol: String,
    pub last_price: String,
    #[serde(default)]
    pub bid_price: Option<String>,
    #[serde(default)]
    pub ask_price: Option<String>,
    #[serde(default)]
    pub quote_volume: Option<String>,
    pub close_time: i64,
}

fn parse_num(field: &str, raw: &str) -> Result<f64, PriceFeedError> {
    raw.parse::<f64>()
        .map_err(|_| PriceFeedError::Data(format!("{field}: not a number: {raw:?}")))
}

fn parse_opt(field: &str, raw: Option<&str>) -> Result<Option<f64>, PriceFeedError> {
    raw.map(|r| parse_num(field, r)).transpose()
}

impl Ticker24h {
    /// Convert to a unified ticker. `pair` overrides the name derived from the market id.
    pub fn into_ticker(self, pair: Option<&str>) -> Result<Ticker, PriceFeedError> {
        let symbol = match pair {
            Some(p) => p.to_string(),
            None => from_market_id(&self.symbol).unwrap_or_else(|| self.symbol.clone()),
        };
        Ok(Ticker {
            last: parse_num("lastPrice", &self.last_price)?,
            bid: parse_opt("bidPrice", self.bid_price.as_deref())?,
            ask: parse_opt("askPrice", self.ask_price.as_deref())?,
            volume: parse_opt("quoteVolume", self.quote_volume.as_deref())?.unwrap_or(0.0),
            timestamp: self.close_time,
            symbol,
        })
    }
}

/// Parse a `/api/v3/klines` body: `[[openTime, "o", "h", "l", "c", "v", closeTime, ...], ...]`.
pub(crate) fn parse_klines(body: &str) -> Result<Vec<Candle>, PriceFeedError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| PriceFeedError::Data(format!("klines: {e}")))?;
    rows.iter().map(|row| parse_kline(row)).collect()
}

fn parse_kline(row: &[Value]) -> Result<Candle, PriceFeedError> {
    if row.len() < 6 {
        return Err(PriceFeedError::Data(format!(
            "kline has {} fields, expected at least 6",
            row.len()
        )));
    }
    let timestamp = row[0]
        .as_i64()
        .ok_or_else(|| PriceFeedError::Data(format!("kline open time: {}", row[0])))?;
    let field = |idx: usize, name: &str| -> Result<f64, PriceFeedError> {
        match &row[idx] {
            Value::String(s) => parse_num(name, s),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| PriceFeedError::Data(format!("{name}: {n}"))),
            other => Err(PriceFeedError::Data(format!("{name}: {other}"))),
        }
    };
    Ok(Candle {
        timestamp,
        open: field(1, "open")?,
        high: field(2, "high")?,
        low: field(3, "low")?,
        close: field(4, "close")?,
        volume: field(5, "volume")?,
    })
}
