//! Freshness evaluation for cached feed entries.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::entry::CacheEntry;
use crate::utils::duration_ms;

/// Whether an entry's age is below its feed's TTL.
///
/// `ttl` of zero makes every entry stale. Clock skew is not compensated: an
/// entry stamped in the future has a negative age and counts as fresh.
pub fn is_fresh(fetched_at_ms: i64, now_ms: i64, ttl: Duration) -> bool {
    now_ms.saturating_sub(fetched_at_ms) < duration_ms(ttl)
}

/// Result of evaluating an entry against a [`FreshnessPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Younger than the TTL. Shown as-is; still revalidated in the background.
    Fresh,
    /// At or beyond the TTL. Still usable for display.
    Stale,
}

/// Per-feed maximum age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub ttl: Duration,
}

impl FreshnessPolicy {
    pub fn new(ttl: Duration) -> Self {
        FreshnessPolicy { ttl }
    }

    pub fn evaluate<V>(&self, entry: &CacheEntry<V>, now_ms: i64) -> Freshness {
        if is_fresh(entry.fetched_at, now_ms, self.ttl) {
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }
}

/// What to show first when the cached entry is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Show the stale entry immediately; the fallback is only used on a miss.
    #[default]
    StaleFirst,
    /// Prefer the bundled fallback over a stale entry, keeping the stale
    /// entry if the fallback cannot be read.
    PreferFallback,
}
