use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use crate::error::CacheError;
use crate::store::Store;
use crate::utils::build_cache_key;

/// Configuration for MokaStore.
#[derive(Debug, Clone)]
pub struct MokaStoreConfig {
    /// Maximum number of entries the cache can hold.
    pub max_capacity: u64,

    /// Entries are dropped this long after insertion.
    /// `None` keeps entries until capacity pressure evicts them.
    ///
    /// This bounds how long a stale entry stays available for display; it
    /// is unrelated to a feed's freshness TTL.
    pub time_to_live: Option<Duration>,
}

impl Default for MokaStoreConfig {
    fn default() -> Self {
        MokaStoreConfig {
            max_capacity: 10_000,
            time_to_live: None,
        }
    }
}

/// Bounded, concurrent in-process store backed by Moka.
///
/// Use it as the first tier in front of a durable store when many tasks
/// load the same feeds, or alone when memory must stay bounded.
pub struct MokaStore {
    cache: Cache<String, String>,
}

impl MokaStore {
    /// Create a new MokaStore with the given configuration.
    ///
    /// # Example
    /// ```ignore
    /// let store = MokaStore::new(MokaStoreConfig {
    ///     max_capacity: 1_000,
    ///     time_to_live: Some(Duration::from_secs(86_400)),
    /// });
    /// ```
    pub fn new(config: MokaStoreConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_capacity);

        if let Some(ttl) = config.time_to_live {
            builder = builder.time_to_live(ttl);
        }

        MokaStore {
            cache: builder.build(),
        }
    }

    /// Approximate number of entries (for monitoring/debugging).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl Store for MokaStore {
    fn name(&self) -> &'static str {
        "moka"
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, CacheError> {
        let cache_key = build_cache_key(namespace, key);
        Ok(self.cache.get(&cache_key).await)
    }

    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), CacheError> {
        let cache_key = build_cache_key(namespace, key);
        self.cache.insert(cache_key, value).await;
        Ok(())
    }

    async fn remove(&self, namespace: &str, keys: &[&str]) -> Result<(), CacheError> {
        for key in keys {
            let cache_key = build_cache_key(namespace, key);
            self.cache.invalidate(&cache_key).await;
        }

        Ok(())
    }
}
