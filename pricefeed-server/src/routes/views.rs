//! JSON payloads returned by the API.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use pricefeed::{BackfillReport, BackfillStatus, HistoryStatus, PricePoint, Strategy, Symbol};

fn iso(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Serialize)]
pub struct SymbolView {
    pub id: i64,
    pub symbol: String,
    pub is_active: bool,
    pub created_at: String,
    pub last_price: Option<f64>,
    pub last_price_at: Option<String>,
}

impl From<&Symbol> for SymbolView {
    fn from(s: &Symbol) -> Self {
        Self {
            id: s.id,
            symbol: s.symbol.clone(),
            is_active: s.is_active(),
            created_at: iso(s.created_at),
            last_price: s.last_price,
            last_price_at: s.last_price_at.map(iso),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SymbolList {
    pub symbols: Vec<SymbolView>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ReportView {
    pub symbol: String,
    pub status: BackfillStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub records_stored: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_from_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_to_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<BackfillReport> for ReportView {
    fn from(r: BackfillReport) -> Self {
        Self {
            symbol: r.symbol,
            status: r.status,
            strategy: r.strategy,
            reason: r.reason,
            records_stored: r.records_stored,
            fetch_from_ms: r.fetch_from_ms,
            fetch_to_ms: r.fetch_to_ms,
            error: r.error.map(|e| e.to_string()),
        }
    }
}

/// Stored-history summary plus the outcome of the registration backfill.
#[derive(Debug, Serialize)]
pub struct RegistrationStatus {
    #[serde(flatten)]
    pub history: HistoryStatus,
    pub backfill_result: Option<ReportView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backfill_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Registration {
    pub symbol: SymbolView,
    pub backfill_status: RegistrationStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PriceView {
    pub timestamp: i64,
    pub datetime: Option<String>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<&PricePoint> for PriceView {
    fn from(p: &PricePoint) -> Self {
        Self {
            timestamp: p.timestamp,
            datetime: DateTime::from_timestamp_millis(p.timestamp).map(iso),
            open: p.open,
            high: p.high,
            low: p.low,
            close: p.close,
            volume: p.volume,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub start: i64,
    pub end: i64,
    pub count: usize,
    pub prices: Vec<PriceView>,
}

#[derive(Debug, Serialize)]
pub struct SweepSummary {
    pub count: usize,
    pub records_stored: usize,
    pub results: Vec<ReportView>,
}
