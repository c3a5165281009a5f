//! The central feed table.
//!
//! Every feed of a site is declared once here, with its store key and TTL,
//! instead of each page inventing its own key string. Building the table
//! fails when two feeds would share a key.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::decode::Decoder;
use crate::error::CacheError;
use crate::feed::{Feed, FeedSpec};
use crate::swr::SwrCache;

/// Builder for a [`FeedRegistry`].
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(FileStore::new(FileStoreConfig::default())?);
/// let cache = SwrCache::new("site", store);
///
/// let registry = FeedRegistryBuilder::new()
///     .add(FeedSpec::new("navbar", Duration::from_secs(60), navbar_source))
///     .add(FeedSpec::new("home", Duration::from_secs(600), home_source))
///     .build(cache)?;
///
/// let navbar = registry.feed("navbar", Decoder::<Vec<MenuItem>>::at("/content"))?;
/// ```
#[derive(Debug, Default)]
pub struct FeedRegistryBuilder {
    feeds: Vec<FeedSpec>,
}

impl FeedRegistryBuilder {
    pub fn new() -> Self {
        FeedRegistryBuilder { feeds: Vec::new() }
    }

    /// Add a feed declaration. Validation happens in [`build`](Self::build).
    pub fn add(mut self, spec: FeedSpec) -> Self {
        self.feeds.push(spec);
        self
    }

    /// Validate the table and bind it to a cache.
    ///
    /// Fails on empty keys, duplicate feed names and shared keys.
    pub fn build(self, cache: SwrCache) -> Result<FeedRegistry, CacheError> {
        let mut names: HashSet<&str> = HashSet::new();
        let mut keys: HashMap<&str, &str> = HashMap::new();

        for spec in &self.feeds {
            if spec.key.is_empty() {
                return Err(CacheError::InvalidKey(spec.key.clone()));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(CacheError::DuplicateFeed(spec.name.clone()));
            }
            if let Some(first) = keys.insert(spec.key.as_str(), spec.name.as_str()) {
                return Err(CacheError::KeyCollision {
                    key: spec.key.clone(),
                    first: first.to_string(),
                    second: spec.name.clone(),
                });
            }
        }

        Ok(FeedRegistry {
            cache,
            feeds: self.feeds.into_iter().map(Arc::new).collect(),
        })
    }
}

/// A validated set of feeds sharing one cache.
pub struct FeedRegistry {
    cache: SwrCache,
    feeds: Vec<Arc<FeedSpec>>,
}

impl FeedRegistry {
    /// Look up a feed declaration by name.
    pub fn spec(&self, name: &str) -> Option<&FeedSpec> {
        self.feeds
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.as_ref())
    }

    /// Bind a feed to the payload type a caller expects.
    pub fn feed<V>(&self, name: &str, decoder: Decoder<V>) -> Result<Feed<V>, CacheError>
    where
        V: Clone + Send + Sync + 'static,
    {
        let spec = self
            .feeds
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| CacheError::UnknownFeed(name.to_string()))?;
        Ok(Feed::new(Arc::clone(spec), self.cache.clone(), decoder))
    }

    /// Feed names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.feeds.iter().map(|spec| spec.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    pub fn cache(&self) -> &SwrCache {
        &self.cache
    }
}
