pub mod candles;
pub mod tickers;

/// Frozen exchange clock used by the fixture connector: 2023-11-14 22:14:20.500 UTC.
pub const NOW_MS: i64 = 1_700_000_060_500;
