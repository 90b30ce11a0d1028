use pricefeed_core::Ticker;

use super::NOW_MS;

pub fn by_symbol(s: &str) -> Option<Ticker> {
    let (last, bid, ask, volume) = match s {
        "BTC/USDT" => (37_250.5, 37_250.0, 37_251.0, 1_250_000_000.0),
        "ETH/USDT" => (2_050.25, 2_050.2, 2_050.3, 640_000_000.0),
        "SOL/USDT" => (58.42, 58.41, 58.43, 95_000_000.0),
        _ => return None,
    };
    Some(Ticker {
        symbol: s.to_string(),
        last,
        bid: Some(bid),
        ask: Some(ask),
        // ticker timestamps are not minute aligned upstream
        timestamp: NOW_MS - 1_234,
        volume,
    })
}
