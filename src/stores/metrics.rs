//! Metrics middleware for stores.
//!
//! `MetricsStore` wraps any store and reports every read, write and remove
//! to a [`MetricsSink`]. Reads also report the age of the entry they found,
//! which is how a site can tell how old the content it is serving really is.
//!
//! # Example
//!
//! ```ignore
//! let file = Arc::new(FileStore::new(FileStoreConfig::default())?);
//! let store: Arc<dyn Store> = Arc::new(MetricsStore::new(file, Arc::new(TracingSink)));
//! let cache = SwrCache::new("site", store);
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::store::Store;
use crate::utils::now_ms;

/// Metrics emitted by the MetricsStore wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheMetric {
    /// Emitted on every read (get) operation.
    Read {
        key: String,
        /// Whether a value was found.
        hit: bool,
        /// Age of the found entry in milliseconds; `None` on a miss or an unreadable entry.
        age_ms: Option<i64>,
        /// `false` when the underlying store returned an error.
        ok: bool,
        latency_ms: f64,
        /// Name of the wrapped store (from `Store::name()`).
        tier: String,
        namespace: String,
    },
    /// Emitted on every write (set) operation.
    Write {
        key: String,
        ok: bool,
        latency_ms: f64,
        tier: String,
        namespace: String,
    },
    /// Emitted on every remove operation.
    Remove {
        /// Number of keys in the remove batch.
        key_count: usize,
        /// First key in the batch (for identification).
        first_key: Option<String>,
        ok: bool,
        latency_ms: f64,
        tier: String,
        namespace: String,
    },
}

/// Receiver for store metrics.
///
/// `emit` runs inline with the store operation and should only buffer or log.
pub trait MetricsSink: Send + Sync {
    fn emit(&self, metric: CacheMetric);
}

/// Sink that writes every metric as a `tracing` debug event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn emit(&self, metric: CacheMetric) {
        match metric {
            CacheMetric::Read {
                key,
                hit,
                age_ms,
                ok,
                latency_ms,
                tier,
                namespace,
            } => tracing::debug!(
                %namespace, %key, %tier, hit, ok, ?age_ms, latency_ms,
                "store read"
            ),
            CacheMetric::Write {
                key,
                ok,
                latency_ms,
                tier,
                namespace,
            } => tracing::debug!(%namespace, %key, %tier, ok, latency_ms, "store write"),
            CacheMetric::Remove {
                key_count,
                first_key,
                ok,
                latency_ms,
                tier,
                namespace,
            } => tracing::debug!(
                %namespace, %tier, key_count, ?first_key, ok, latency_ms,
                "store remove"
            ),
        }
    }
}

/// A store wrapper that emits metrics for all operations.
pub struct MetricsStore {
    inner: Arc<dyn Store>,
    sink: Arc<dyn MetricsSink>,
    tier_name: String,
}

impl MetricsStore {
    pub fn new(inner: Arc<dyn Store>, sink: Arc<dyn MetricsSink>) -> Self {
        let tier_name = inner.name().to_string();
        MetricsStore {
            inner,
            sink,
            tier_name,
        }
    }

    pub fn sink(&self) -> &Arc<dyn MetricsSink> {
        &self.sink
    }

    fn elapsed_ms(start: Instant) -> f64 {
        start.elapsed().as_secs_f64() * 1000.0
    }
}

#[async_trait]
impl Store for MetricsStore {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, CacheError> {
        let start = Instant::now();
        let result = self.inner.get(namespace, key).await;
        let latency_ms = Self::elapsed_ms(start);

        let (hit, age_ms) = match &result {
            Ok(Some(data)) => {
                let age = CacheEntry::decode(data)
                    .ok()
                    .map(|entry| entry.age_ms(now_ms()));
                (true, age)
            }
            Ok(None) | Err(_) => (false, None),
        };

        self.sink.emit(CacheMetric::Read {
            key: key.to_string(),
            hit,
            age_ms,
            ok: result.is_ok(),
            latency_ms,
            tier: self.tier_name.clone(),
            namespace: namespace.to_string(),
        });

        result
    }

    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.set(namespace, key, value).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(CacheMetric::Write {
            key: key.to_string(),
            ok: result.is_ok(),
            latency_ms,
            tier: self.tier_name.clone(),
            namespace: namespace.to_string(),
        });

        result
    }

    async fn remove(&self, namespace: &str, keys: &[&str]) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.remove(namespace, keys).await;
        let latency_ms = Self::elapsed_ms(start);

        self.sink.emit(CacheMetric::Remove {
            key_count: keys.len(),
            first_key: keys.first().map(|k| k.to_string()),
            ok: result.is_ok(),
            latency_ms,
            tier: self.tier_name.clone(),
            namespace: namespace.to_string(),
        });

        result
    }
}
