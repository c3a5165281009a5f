use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::decode::Decoder;
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::freshness::StalePolicy;
use crate::snapshot::Loaded;
use crate::source::Source;
use crate::swr::{LoadOptions, SwrCache};

/// Declaration of one feed: where it lives in the store, how long it stays
/// fresh, and where its content comes from.
#[derive(Clone)]
pub struct FeedSpec {
    /// Name callers use to look the feed up.
    pub name: String,
    /// Store key. Must be unique across a registry.
    pub key: String,
    pub ttl: Duration,
    pub remote: Arc<dyn Source>,
    pub fallback: Option<Arc<dyn Source>>,
    pub stale_policy: StalePolicy,
}

impl FeedSpec {
    /// Declare a feed whose store key equals its name.
    pub fn new(name: impl Into<String>, ttl: Duration, remote: Arc<dyn Source>) -> Self {
        let name = name.into();
        FeedSpec {
            key: name.clone(),
            name,
            ttl,
            remote,
            fallback: None,
            stale_policy: StalePolicy::default(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Source>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_stale_policy(mut self, stale_policy: StalePolicy) -> Self {
        self.stale_policy = stale_policy;
        self
    }

    pub(crate) fn load_options<V>(&self, decoder: Decoder<V>) -> LoadOptions<V> {
        LoadOptions {
            ttl: self.ttl,
            remote: Arc::clone(&self.remote),
            fallback: self.fallback.clone(),
            decoder,
            stale_policy: self.stale_policy,
        }
    }
}

impl fmt::Debug for FeedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSpec")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .field("remote", &self.remote.describe())
            .field("fallback", &self.fallback.as_ref().map(|s| s.describe()))
            .field("stale_policy", &self.stale_policy)
            .finish()
    }
}

/// A registered feed bound to a cache and a payload decoder.
///
/// Cheap to clone; a page or component keeps one and calls [`Feed::load`]
/// each time it mounts.
pub struct Feed<V> {
    spec: Arc<FeedSpec>,
    cache: SwrCache,
    decoder: Decoder<V>,
}

impl<V> Clone for Feed<V> {
    fn clone(&self) -> Self {
        Feed {
            spec: Arc::clone(&self.spec),
            cache: self.cache.clone(),
            decoder: self.decoder.clone(),
        }
    }
}

impl<V> Feed<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(spec: Arc<FeedSpec>, cache: SwrCache, decoder: Decoder<V>) -> Self {
        Feed {
            spec,
            cache,
            decoder,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn key(&self) -> &str {
        &self.spec.key
    }

    pub fn ttl(&self) -> Duration {
        self.spec.ttl
    }

    pub fn spec(&self) -> &FeedSpec {
        &self.spec
    }

    /// Stale-while-revalidate load; see [`SwrCache::load`].
    ///
    /// # Example
    /// ```ignore
    /// let mut loaded = navbar.load().await?;
    /// if let Some(snapshot) = loaded.initial() {
    ///     render(&snapshot.payload);
    /// }
    /// if let Some(update) = loaded.updated().await {
    ///     render(&update.payload);
    /// }
    /// ```
    pub async fn load(&self) -> Result<Loaded<V>, CacheError> {
        self.cache
            .load(&self.spec.key, self.spec.load_options(self.decoder.clone()))
            .await
    }

    /// The cached entry, if one exists and decodes. Never touches the network.
    pub async fn cached(&self) -> Result<Option<CacheEntry<V>>, CacheError> {
        self.cache.get(&self.spec.key, &self.decoder).await
    }

    /// Drop the cached entry so the next load starts from the fallback.
    pub async fn invalidate(&self) -> Result<(), CacheError> {
        self.cache.remove(&self.spec.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotSource;
    use crate::source::StaticSource;
    use crate::stores::memory::HashMapStore;
    use serde_json::{Value, json};

    fn navbar_feed() -> Feed<Vec<Value>> {
        let spec = FeedSpec::new(
            "navbar",
            Duration::from_secs(300),
            Arc::new(StaticSource::json(&json!({"content": [{"title": "Committees"}]}))),
        )
        .with_key("navbar:committees")
        .with_fallback(Arc::new(StaticSource::json(&json!({"content": []}))));

        let cache = SwrCache::new("site", Arc::new(HashMapStore::new()));
        Feed::new(Arc::new(spec), cache, Decoder::at("/content"))
    }

    #[tokio::test]
    async fn test_feed_load_uses_spec() {
        let feed = navbar_feed();
        assert_eq!(feed.name(), "navbar");
        assert_eq!(feed.key(), "navbar:committees");

        let mut loaded = feed.load().await.unwrap();
        let initial = loaded.initial().unwrap();
        assert_eq!(initial.source, SnapshotSource::Fallback);
        assert!(initial.payload.is_empty());

        let update = loaded.updated().await.unwrap();
        assert_eq!(update.payload, vec![json!({"title": "Committees"})]);
    }

    #[tokio::test]
    async fn test_feed_cached_and_invalidate() {
        let feed = navbar_feed();
        assert!(feed.cached().await.unwrap().is_none());

        let mut loaded = feed.load().await.unwrap();
        assert!(loaded.revalidation().unwrap().finished().await.persisted());

        let cached = feed.cached().await.unwrap().unwrap();
        assert_eq!(cached.payload.len(), 1);

        feed.invalidate().await.unwrap();
        assert!(feed.cached().await.unwrap().is_none());
    }

    #[test]
    fn test_spec_debug_describes_sources() {
        let rendered = format!("{:?}", navbar_feed().spec());
        assert!(rendered.contains("navbar:committees"));
        assert!(rendered.contains("static"));
    }
}
