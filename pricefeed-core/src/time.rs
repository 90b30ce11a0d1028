//! Minute-granularity time helpers shared by planners and stores.

use chrono::{DateTime, Utc};

/// One minute in milliseconds.
pub const MINUTE_MS: i64 = 60_000;

/// Floor an epoch-millisecond timestamp to the start of its minute.
///
/// Uses Euclidean division so pre-epoch timestamps floor towards negative infinity.
#[must_use]
pub const fn floor_to_minute(ts_ms: i64) -> i64 {
    ts_ms.div_euclid(MINUTE_MS) * MINUTE_MS
}

/// Whether `ts_ms` sits exactly on a minute boundary.
#[must_use]
pub const fn is_minute_aligned(ts_ms: i64) -> bool {
    ts_ms.rem_euclid(MINUTE_MS) == 0
}

/// Start of the last fully closed minute before `now_ms`.
///
/// The minute containing `now_ms` is still forming, so the window ends one
/// minute before its boundary.
#[must_use]
pub const fn last_closed_minute(now_ms: i64) -> i64 {
    floor_to_minute(now_ms) - MINUTE_MS
}

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds into a UTC timestamp, if representable.
#[must_use]
pub fn to_datetime(ts_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_ms)
}
