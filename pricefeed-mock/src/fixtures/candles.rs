use pricefeed_core::{Candle, MINUTE_MS, floor_to_minute};

/// Anchor price per pair; unknown pairs have no candle data.
pub fn base_price(s: &str) -> Option<f64> {
    match s {
        "BTC/USDT" => Some(37_000.0),
        "ETH/USDT" => Some(2_000.0),
        "SOL/USDT" => Some(58.0),
        _ => None,
    }
}

/// Deterministic one-minute candles starting at the minute containing `since_ms`.
///
/// Candles never extend past `until_ms`, mirroring an exchange that only
/// returns closed minutes.
pub fn series(base: f64, since_ms: i64, limit: u32, until_ms: i64) -> Vec<Candle> {
    let start = floor_to_minute(since_ms);
    (0..i64::from(limit))
        .map(|i| (i, start + i * MINUTE_MS))
        .take_while(|(_, ts)| *ts <= until_ms)
        .map(|(i, ts)| {
            let drift = (i % 7) as f64 * 0.5;
            let open = base + drift;
            let close = open + 0.25;
            Candle {
                timestamp: ts,
                open,
                high: close + 0.5,
                low: open - 0.5,
                close,
                volume: 10.0 + (i % 5) as f64,
            }
        })
        .collect()
}
