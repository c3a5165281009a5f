use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::store::Store;
use crate::utils::build_cache_key;

/// Thread-safe in-memory store using HashMap with RwLock.
///
/// Lives as long as the process and is shared by every feed handed the same
/// `Arc`. Suitable for tests, short-lived tools and as the first tier in front
/// of a [`FileStore`](crate::FileStore).
///
/// Entries are never evicted.
#[derive(Default)]
pub struct HashMapStore {
    state: RwLock<HashMap<String, String>>,
}

impl HashMapStore {
    /// Create an empty store.
    pub fn new() -> Self {
        HashMapStore {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries across all namespaces.
    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }
}

#[async_trait]
impl Store for HashMapStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, CacheError> {
        let cache_key = build_cache_key(&namespace, key);
        let state = self.state.read().await;
        Ok(state.get(&cache_key).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), CacheError> {
        let cache_key = build_cache_key(&namespace, key);
        let mut state = self.state.write().await;
        state.insert(cache_key, value);
        Ok(())
    }

    async fn remove(&self, namespace: &str, keys: &[&str]) -> Result<(), CacheError> {
        let mut state = self.state.write().await;

        for key in keys {
            let cache_key = build_cache_key(&namespace, key);
            state.remove(&cache_key);
        }

        Ok(())
    }
}
