use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::decode::Decoder;
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::freshness::{Freshness, FreshnessPolicy, StalePolicy};
use crate::snapshot::{Loaded, RevalidationHandle, RevalidationOutcome, Snapshot, SnapshotSource};
use crate::source::Source;
use crate::store::Store;
use crate::utils::now_ms;

/// Everything one `load()` needs to know about a feed.
pub struct LoadOptions<V> {
    /// Maximum age before the cached entry is considered stale.
    pub ttl: Duration,
    /// The feed's network endpoint. Called once per load.
    pub remote: Arc<dyn Source>,
    /// Bundled document shown when nothing usable is cached.
    pub fallback: Option<Arc<dyn Source>>,
    /// Validates documents from every origin: store, fallback and network.
    pub decoder: Decoder<V>,
    pub stale_policy: StalePolicy,
}

impl<V> Clone for LoadOptions<V> {
    fn clone(&self) -> Self {
        LoadOptions {
            ttl: self.ttl,
            remote: Arc::clone(&self.remote),
            fallback: self.fallback.clone(),
            decoder: self.decoder.clone(),
            stale_policy: self.stale_policy,
        }
    }
}

impl<V> LoadOptions<V> {
    pub fn new(ttl: Duration, remote: Arc<dyn Source>, decoder: Decoder<V>) -> Self {
        LoadOptions {
            ttl,
            remote,
            fallback: None,
            decoder,
            stale_policy: StalePolicy::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Source>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_stale_policy(mut self, stale_policy: StalePolicy) -> Self {
        self.stale_policy = stale_policy;
        self
    }
}

/// Stale-while-revalidate cache over a [`Store`].
///
/// Every entry lives in one namespace of the store (the site's "origin").
/// The raw remote document is what gets persisted; the caller's decoder runs
/// on every read, so an entry that no longer matches the expected shape is
/// treated as a miss instead of being handed to the caller.
#[derive(Clone)]
pub struct SwrCache {
    namespace: String,
    store: Arc<dyn Store>,
}

impl SwrCache {
    /// Create a new SWR cache.
    ///
    /// # Arguments
    /// * `namespace` - Scope shared by all feeds of one site
    /// * `store` - The underlying store implementation
    pub fn new(namespace: impl Into<String>, store: Arc<dyn Store>) -> Self {
        SwrCache {
            namespace: namespace.into(),
            store,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Read and decode the cached entry without touching the network.
    ///
    /// `Ok(None)` for misses and for entries the decoder rejects.
    pub async fn get<V>(
        &self,
        key: &str,
        decoder: &Decoder<V>,
    ) -> Result<Option<CacheEntry<V>>, CacheError>
    where
        V: 'static,
    {
        check_key(key)?;
        let Some(data) = self.store.get(&self.namespace, key).await? else {
            return Ok(None);
        };
        let entry = CacheEntry::decode(&data)?;
        match decoder.decode(entry.payload) {
            Ok(payload) => Ok(Some(CacheEntry::new(payload, entry.fetched_at))),
            Err(e) => {
                tracing::debug!(namespace = %self.namespace, %key, error = %e, "cached entry rejected by decoder");
                Ok(None)
            }
        }
    }

    /// Write a document as if it had just been fetched.
    pub async fn set<T>(&self, key: &str, document: &T) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
    {
        check_key(key)?;
        let encoded = CacheEntry::new(document, now_ms()).encode()?;
        self.store.set(&self.namespace, key, encoded).await
    }

    /// Removes the key from the cache.
    pub async fn remove(&self, key: &str) -> Result<(), CacheError> {
        check_key(key)?;
        self.store.remove(&self.namespace, &[key]).await
    }

    /// Stale-while-revalidate load of one feed.
    ///
    /// Resolves the initial snapshot first:
    /// - a fresh cached entry is used as-is
    /// - a stale cached entry is used as-is under [`StalePolicy::StaleFirst`]; under
    ///   [`StalePolicy::PreferFallback`] the fallback replaces it when readable
    /// - otherwise the fallback is fetched and shown without being persisted
    ///
    /// Then the remote endpoint is fetched in a detached task. A payload that
    /// decodes is persisted and sent as the update; any failure leaves the
    /// store untouched and sends nothing.
    ///
    /// The only error is an empty key. Every I/O failure is contained and
    /// shows up as a missing snapshot or a missing update.
    pub async fn load<V>(&self, key: &str, opts: LoadOptions<V>) -> Result<Loaded<V>, CacheError>
    where
        V: Clone + Send + Sync + 'static,
    {
        check_key(key)?;

        let initial = self.initial_snapshot(key, &opts).await;
        let floor = initial.as_ref().map(|s| s.fetched_at).unwrap_or(i64::MIN);

        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(revalidate(
            Arc::clone(&self.store),
            self.namespace.clone(),
            key.to_string(),
            Arc::clone(&opts.remote),
            opts.decoder.clone(),
            floor,
            tx,
        ));

        Ok(Loaded::new(initial, rx, RevalidationHandle { task }))
    }

    async fn initial_snapshot<V>(&self, key: &str, opts: &LoadOptions<V>) -> Option<Snapshot<V>>
    where
        V: 'static,
    {
        let Some(entry) = self.read_entry(key, &opts.decoder).await else {
            return self.fetch_fallback(key, opts).await;
        };

        let freshness = FreshnessPolicy::new(opts.ttl).evaluate(&entry, now_ms());
        let source = match freshness {
            Freshness::Fresh => SnapshotSource::Fresh,
            Freshness::Stale => SnapshotSource::Stale,
        };

        if freshness == Freshness::Stale
            && opts.stale_policy == StalePolicy::PreferFallback
            && let Some(fallback) = self.fetch_fallback(key, opts).await
        {
            return Some(fallback);
        }

        tracing::debug!(namespace = %self.namespace, %key, ?source, "serving cached entry");
        Some(Snapshot {
            payload: entry.payload,
            fetched_at: entry.fetched_at,
            source,
        })
    }

    /// Read the cached entry, treating every kind of failure as a miss.
    async fn read_entry<V>(&self, key: &str, decoder: &Decoder<V>) -> Option<CacheEntry<V>>
    where
        V: 'static,
    {
        let data = match self.store.get(&self.namespace, key).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(namespace = %self.namespace, %key, "cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    namespace = %self.namespace,
                    %key,
                    tier = self.store.name(),
                    error = %e,
                    "store read failed, treating as miss"
                );
                return None;
            }
        };

        let entry = match CacheEntry::decode(&data) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(namespace = %self.namespace, %key, error = %e, "corrupt cache entry, treating as miss");
                return None;
            }
        };

        match decoder.decode(entry.payload) {
            Ok(payload) => Some(CacheEntry::new(payload, entry.fetched_at)),
            Err(e) => {
                tracing::warn!(namespace = %self.namespace, %key, error = %e, "cached entry rejected by decoder, treating as miss");
                None
            }
        }
    }

    async fn fetch_fallback<V>(&self, key: &str, opts: &LoadOptions<V>) -> Option<Snapshot<V>>
    where
        V: 'static,
    {
        let fallback = opts.fallback.as_ref()?;

        let body = match fallback.fetch().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(%key, source = %fallback.describe(), error = %e, "fallback fetch failed");
                return None;
            }
        };

        match opts.decoder.decode_str(&body) {
            Ok(payload) => {
                tracing::debug!(%key, source = %fallback.describe(), "serving fallback");
                Some(Snapshot {
                    payload,
                    fetched_at: now_ms(),
                    source: SnapshotSource::Fallback,
                })
            }
            Err(e) => {
                tracing::warn!(%key, source = %fallback.describe(), error = %e, "fallback document rejected");
                None
            }
        }
    }
}

fn check_key(key: &str) -> Result<(), CacheError> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Background network step of a load.
///
/// Runs detached from the caller: the store write happens even when the
/// receiving end of `tx` is gone. `floor` is the initial snapshot's
/// timestamp; the update is never stamped earlier than it.
async fn revalidate<V>(
    store: Arc<dyn Store>,
    namespace: String,
    key: String,
    remote: Arc<dyn Source>,
    decoder: Decoder<V>,
    floor: i64,
    tx: oneshot::Sender<Snapshot<V>>,
) -> RevalidationOutcome
where
    V: 'static,
{
    let body = match remote.fetch().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(%namespace, %key, source = %remote.describe(), error = %e, "revalidation fetch failed");
            return RevalidationOutcome::FetchFailed(e.to_string());
        }
    };

    let document: Value = match serde_json::from_str(&body) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(%namespace, %key, source = %remote.describe(), error = %e, "revalidation returned invalid JSON");
            return RevalidationOutcome::DecodeFailed(e.to_string());
        }
    };

    let payload = match decoder.decode(document.clone()) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(%namespace, %key, source = %remote.describe(), error = %e, "revalidation payload rejected");
            return RevalidationOutcome::DecodeFailed(e.to_string());
        }
    };

    let fetched_at = now_ms().max(floor);
    let persisted = match CacheEntry::new(document, fetched_at).encode() {
        Ok(encoded) => store.set(&namespace, &key, encoded).await,
        Err(e) => Err(e),
    };

    let outcome = match persisted {
        Ok(()) => {
            tracing::debug!(%namespace, %key, fetched_at, "revalidated");
            RevalidationOutcome::Revalidated
        }
        Err(e) => {
            tracing::warn!(%namespace, %key, tier = store.name(), error = %e, "failed to persist revalidated entry");
            RevalidationOutcome::StoreFailed(e.to_string())
        }
    };

    let update = Snapshot {
        payload,
        fetched_at,
        source: SnapshotSource::Network,
    };
    if tx.send(update).is_err() {
        tracing::debug!(%namespace, %key, "caller went away before the update arrived");
    }

    outcome
}
