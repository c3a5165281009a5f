//! JSON configuration for a site's feed table and store backend.
//!
//! ```json
//! {
//!   "namespace": "site",
//!   "store": { "kind": "tiered", "tiers": [
//!     { "kind": "moka", "max_capacity": 1000 },
//!     { "kind": "file" }
//!   ]},
//!   "feeds": [
//!     { "name": "navbar", "key": "navbar:committees", "ttl_secs": 60,
//!       "url": "https://sheets.example.org/navbar", "fallback_path": "public/navbar.json" }
//!   ]
//! }
//! ```
//!
//! Relative fallback paths are resolved against the directory of the config file.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::CacheError;
use crate::feed::FeedSpec;
use crate::freshness::StalePolicy;
use crate::registry::{FeedRegistry, FeedRegistryBuilder};
use crate::source::{DEFAULT_HTTP_TIMEOUT, FileSource, HttpSource, Source};
use crate::store::Store;
use crate::stores::{
    FileStore, FileStoreConfig, HashMapStore, MetricsStore, MokaStore, MokaStoreConfig, RedisStore,
    RedisStoreConfig, TracingSink,
};
use crate::swr::SwrCache;
use crate::tiered::TieredStore;

/// Overrides the directory of every file store.
pub const ENV_CACHE_DIR: &str = "FEED_CACHE_DIR";
/// Overrides the URL of every Redis store.
pub const ENV_REDIS_URL: &str = "FEED_CACHE_REDIS_URL";

const DEFAULT_NAMESPACE: &str = "site";

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT.as_secs()
}

fn default_moka_capacity() -> u64 {
    MokaStoreConfig::default().max_capacity
}

/// Which store backs the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    Memory,
    File {
        #[serde(default)]
        dir: Option<PathBuf>,
    },
    Moka {
        #[serde(default = "default_moka_capacity")]
        max_capacity: u64,
    },
    Redis {
        url: String,
    },
    Tiered {
        tiers: Vec<StoreConfig>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File { dir: None }
    }
}

impl StoreConfig {
    fn override_file_dir(&mut self, new_dir: &Path) {
        match self {
            StoreConfig::File { dir } => *dir = Some(new_dir.to_path_buf()),
            StoreConfig::Tiered { tiers } => {
                tiers.iter_mut().for_each(|t| t.override_file_dir(new_dir))
            }
            _ => {}
        }
    }

    fn override_redis_url(&mut self, new_url: &str) {
        match self {
            StoreConfig::Redis { url } => *url = new_url.to_string(),
            StoreConfig::Tiered { tiers } => {
                tiers.iter_mut().for_each(|t| t.override_redis_url(new_url))
            }
            _ => {}
        }
    }

    /// Construct the store. Redis stores connect here.
    pub fn build(&self) -> BoxFuture<'_, Result<Arc<dyn Store>, CacheError>> {
        async move {
            let store: Arc<dyn Store> = match self {
                StoreConfig::Memory => Arc::new(HashMapStore::new()),
                StoreConfig::File { dir } => Arc::new(FileStore::new(FileStoreConfig {
                    dir: dir.clone(),
                })?),
                StoreConfig::Moka { max_capacity } => Arc::new(MokaStore::new(MokaStoreConfig {
                    max_capacity: *max_capacity,
                    ..MokaStoreConfig::default()
                })),
                StoreConfig::Redis { url } => Arc::new(
                    RedisStore::new(RedisStoreConfig {
                        url: url.clone(),
                        expire_after: None,
                    })
                    .await?,
                ),
                StoreConfig::Tiered { tiers } => {
                    if tiers.is_empty() {
                        return Err(CacheError::Config("tiered store needs at least one tier".into()));
                    }
                    let mut built = Vec::with_capacity(tiers.len());
                    for tier in tiers {
                        built.push(tier.build().await?);
                    }
                    Arc::new(TieredStore::from_stores(built))
                }
            };
            Ok(store)
        }
        .boxed()
    }
}

/// One feed entry of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    /// Store key; defaults to `name`.
    #[serde(default)]
    pub key: Option<String>,
    /// Required: there is no implicit TTL.
    pub ttl_secs: u64,
    /// Remote endpoint returning the feed's JSON document.
    pub url: String,
    /// Bundled fallback document on disk.
    #[serde(default)]
    pub fallback_path: Option<PathBuf>,
    /// Bundled fallback document served over HTTP (e.g. from the site's own origin).
    #[serde(default)]
    pub fallback_url: Option<String>,
    #[serde(default)]
    pub stale_policy: StalePolicy,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Wrap the store so every operation is logged at debug level.
    #[serde(default)]
    pub log_store_metrics: bool,
    pub feeds: Vec<FeedConfig>,
    /// Directory relative fallback paths are resolved against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Parse a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, CacheError> {
        serde_json::from_str(json).map_err(|e| CacheError::Config(format!("invalid config: {}", e)))
    }

    /// Read and parse a config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CacheError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json_str(&contents)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Apply `FEED_CACHE_DIR` and `FEED_CACHE_REDIS_URL` from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            self.store.override_file_dir(Path::new(&dir));
        }
        if let Some(url) = lookup(ENV_REDIS_URL) {
            self.store.override_redis_url(&url);
        }
    }

    /// Construct the configured store, wrapped for metrics when enabled.
    pub async fn build_store(&self) -> Result<Arc<dyn Store>, CacheError> {
        let store = self.store.build().await?;
        if self.log_store_metrics {
            return Ok(Arc::new(MetricsStore::new(store, Arc::new(TracingSink))));
        }
        Ok(store)
    }

    /// Build the feed table on top of the given store.
    pub fn build_registry(&self, store: Arc<dyn Store>) -> Result<FeedRegistry, CacheError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.http_timeout_secs))
            .build()
            .map_err(|e| CacheError::Config(format!("failed to build HTTP client: {}", e)))?;

        let mut builder = FeedRegistryBuilder::new();
        for feed in &self.feeds {
            let remote: Arc<dyn Source> = Arc::new(HttpSource::with_client(client.clone(), &feed.url));
            let mut spec = FeedSpec::new(&feed.name, Duration::from_secs(feed.ttl_secs), remote)
                .with_stale_policy(feed.stale_policy);

            if let Some(key) = &feed.key {
                spec = spec.with_key(key);
            }

            match (&feed.fallback_path, &feed.fallback_url) {
                (Some(_), Some(_)) => {
                    return Err(CacheError::Config(format!(
                        "feed '{}' sets both fallback_path and fallback_url",
                        feed.name
                    )));
                }
                (Some(path), None) => {
                    spec = spec.with_fallback(Arc::new(FileSource::new(self.resolve(path))));
                }
                (None, Some(url)) => {
                    spec = spec.with_fallback(Arc::new(HttpSource::with_client(client.clone(), url)));
                }
                (None, None) => {}
            }

            builder = builder.add(spec);
        }

        builder.build(SwrCache::new(&self.namespace, store))
    }

    /// Build the store and the feed table in one step.
    pub async fn build(&self) -> Result<FeedRegistry, CacheError> {
        let store = self.build_store().await?;
        self.build_registry(store)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
