use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use crate::error::CacheError;
use crate::store::Store;

/// TieredStore checks multiple stores in order.
///
/// The first store to return a value wins, and that value is copied into all
/// earlier stores in the background. Writes and removes go to every tier.
///
/// A tier that fails on read is skipped; the read only fails when no tier hit
/// and at least one of them errored.
pub struct TieredStore {
    tiers: Vec<Arc<dyn Store>>,
}

impl TieredStore {
    /// Create a new tiered store.
    ///
    /// `stores` can contain `None` so tiers can be assembled conditionally.
    ///
    /// # Example
    /// ```ignore
    /// TieredStore::new(vec![
    ///     Some(memory_store),
    ///     if persist { Some(file_store) } else { None },
    /// ])
    /// ```
    pub fn new(stores: Vec<Option<Arc<dyn Store>>>) -> Self {
        let tiers = stores.into_iter().flatten().collect();
        TieredStore { tiers }
    }

    /// Create a tiered store from a vec of stores (no optional filtering).
    pub fn from_stores(stores: Vec<Arc<dyn Store>>) -> Self {
        TieredStore { tiers: stores }
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    fn backfill(&self, upto: usize, namespace: &str, key: &str, value: &str) {
        let lower_tiers: Vec<_> = self.tiers[..upto].to_vec();
        let namespace = namespace.to_string();
        let key = key.to_string();
        let value = value.to_string();

        tokio::spawn(async move {
            for tier in lower_tiers {
                match tier.set(&namespace, &key, value.clone()).await {
                    Ok(()) => {
                        tracing::debug!(tier = tier.name(), %namespace, %key, "populated lower tier");
                    }
                    Err(e) => {
                        tracing::warn!(
                            tier = tier.name(),
                            %namespace,
                            %key,
                            error = %e,
                            "failed to populate lower tier"
                        );
                    }
                }
            }
        });
    }
}

#[async_trait]
impl Store for TieredStore {
    fn name(&self) -> &'static str {
        "tiered"
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, CacheError> {
        let mut last_error = None;

        for (i, tier) in self.tiers.iter().enumerate() {
            match tier.get(namespace, key).await {
                Ok(Some(value)) => {
                    if i > 0 {
                        self.backfill(i, namespace, key, &value);
                    }
                    return Ok(Some(value));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(tier = tier.name(), %namespace, %key, error = %e, "tier read failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), CacheError> {
        let futures: Vec<_> = self
            .tiers
            .iter()
            .map(|tier| tier.set(namespace, key, value.clone()))
            .collect();

        let results = join_all(futures).await;

        // Return first error if any
        for result in results {
            result?;
        }

        Ok(())
    }

    async fn remove(&self, namespace: &str, keys: &[&str]) -> Result<(), CacheError> {
        let futures: Vec<_> = self
            .tiers
            .iter()
            .map(|tier| tier.remove(namespace, keys))
            .collect();

        let results = join_all(futures).await;

        for result in results {
            result?;
        }

        Ok(())
    }
}
