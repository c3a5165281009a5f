//! Shared utilities for the cache library.

use std::fmt::Display;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Build a composite cache key from namespace and key.
///
/// Format: `{namespace}::{key}`, with `%` and `:` in the namespace
/// percent-escaped so the first `::` always ends the namespace.
pub fn build_cache_key<N: Display + ?Sized>(namespace: &N, key: &str) -> String {
    let namespace = namespace.to_string().replace('%', "%25").replace(':', "%3A");
    format!("{}::{}", namespace, key)
}

/// Get the current time in milliseconds since UNIX epoch.
///
/// A clock set before the epoch reads as `0`.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Convert a duration to whole milliseconds, saturating at `i64::MAX`.
pub fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
