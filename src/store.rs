use async_trait::async_trait;

use crate::error::CacheError;

/// A store is a common interface for storing, reading and deleting feed entries.
///
/// Values are the encoded JSON text of a [`CacheEntry`](crate::CacheEntry), so a
/// store never needs to know the payload type. Entries are replaced whole on
/// every `set`; concurrent writers to the same key resolve last-write-wins.
///
/// Stores do not evict on their own unless their backend does (e.g. moka capacity).
#[async_trait]
pub trait Store: Send + Sync {
    /// A name for metrics/tracing.
    ///
    /// # Example
    /// - "memory"
    /// - "file"
    /// - "tiered"
    fn name(&self) -> &'static str;

    /// Return the stored value.
    ///
    /// The response must be `None` for cache misses.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, CacheError>;

    /// Replace the value for the given key.
    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), CacheError>;

    /// Removes the key(s) from the store.
    async fn remove(&self, namespace: &str, keys: &[&str]) -> Result<(), CacheError>;
}
