use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CacheError;

/// A persisted snapshot of one feed.
///
/// Stored as the JSON object `{"payload": ..., "fetchedAt": <unix ms>}`. The
/// cache key is the store slot and is not repeated inside the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<V = Value> {
    /// The cached content. The cache never interprets its shape.
    pub payload: V,

    /// Unix timestamp in milliseconds at which the payload was retrieved
    /// from the network (or synthesized from a fallback).
    pub fetched_at: i64,
}

impl<V> CacheEntry<V> {
    /// Create a new cache entry.
    pub fn new(payload: V, fetched_at: i64) -> Self {
        CacheEntry {
            payload,
            fetched_at,
        }
    }

    /// Age of the entry in milliseconds. Negative when `fetched_at` lies in the future.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.fetched_at)
    }
}

impl<V: Serialize> CacheEntry<V> {
    /// Encode the entry into the string form written to a store.
    pub fn encode(&self) -> Result<String, CacheError> {
        serde_json::to_string(self)
            .map_err(|e| CacheError::Serialization(format!("Serialization failed: {}", e)))
    }
}

impl CacheEntry<Value> {
    /// Decode an entry from its stored string form.
    ///
    /// The payload is kept as raw JSON; shape validation belongs to the caller's decoder.
    pub fn decode(data: &str) -> Result<Self, CacheError> {
        serde_json::from_str(data)
            .map_err(|e| CacheError::Serialization(format!("Deserialization failed: {}", e)))
    }
}
