//! Pair naming between the unified `BASE/QUOTE` form and Binance market ids.

/// Quote assets recognized when splitting a Binance market id, longest first.
const QUOTES: &[&str] = &[
    "FDUSD", "USDT", "USDC", "TUSD", "BUSD", "EUR", "TRY", "BTC", "ETH", "BNB",
];

/// `BTC/USDT` -> `BTCUSDT`. Case is normalized to upper.
#[must_use]
pub fn to_market_id(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| *c != '/')
        .collect::<String>()
        .to_ascii_uppercase()
}

/// `BTCUSDT` -> `BTC/USDT`, using the known quote assets.
///
/// Returns `None` when no known quote asset suffixes the id.
#[must_use]
pub fn from_market_id(id: &str) -> Option<String> {
    let id = id.to_ascii_uppercase();
    QUOTES.iter().find_map(|q| {
        id.strip_suffix(q)
            .filter(|base| !base.is_empty())
            .map(|base| format!("{base}/{q}"))
    })
}
