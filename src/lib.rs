//! feed-cache - stale-while-revalidate caching for remote JSON feeds
//!
//! Pages of a site that pull their content (navigation menus, events,
//! galleries, ...) from slow remote documents can render immediately from
//! whatever the cache holds, then swap in fresh content once a background
//! fetch lands:
//! - A fresh cached entry renders as-is
//! - A stale entry renders while a revalidation runs
//! - With nothing cached, a bundled fallback document renders instead
//! - Every load revalidates in the background and persists the result
//!
//! # Example
//!
//! ```ignore
//! use feed_cache::{Decoder, FeedRegistryBuilder, FeedSpec, FileStore, FileStoreConfig, HttpSource, SwrCache};
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileStore::new(FileStoreConfig::default())?);
//!     let cache = SwrCache::new("site", store);
//!
//!     let registry = FeedRegistryBuilder::new()
//!         .add(
//!             FeedSpec::new("navbar", Duration::from_secs(60), Arc::new(HttpSource::new("https://sheets.example.org/navbar")?))
//!                 .with_key("navbar:committees"),
//!         )
//!         .build(cache)?;
//!
//!     let navbar = registry.feed("navbar", Decoder::<Vec<serde_json::Value>>::at("/content"))?;
//!     let mut loaded = navbar.load().await?;
//!     if let Some(snapshot) = loaded.initial() {
//!         println!("{} items", snapshot.payload.len());
//!     }
//!     if let Some(update) = loaded.updated().await {
//!         println!("refreshed: {} items", update.payload.len());
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod decode;
mod entry;
mod error;
mod feed;
mod freshness;
mod registry;
mod snapshot;
mod source;
mod store;
pub mod stores;
mod swr;
mod tiered;
mod utils;

// Re-export public API
pub use config::{CacheConfig, ENV_CACHE_DIR, ENV_REDIS_URL, FeedConfig, StoreConfig};
pub use decode::Decoder;
pub use entry::CacheEntry;
pub use error::{CacheError, DecodeError, FetchError};
pub use feed::{Feed, FeedSpec};
pub use freshness::{Freshness, FreshnessPolicy, StalePolicy, is_fresh};
pub use registry::{FeedRegistry, FeedRegistryBuilder};
pub use snapshot::{Loaded, RevalidationHandle, RevalidationOutcome, Snapshot, SnapshotSource};
pub use source::{DEFAULT_HTTP_TIMEOUT, FileSource, FnSource, HttpSource, Source, StaticSource};
pub use store::Store;
pub use stores::file::{FileStore, FileStoreConfig};
pub use stores::memory::HashMapStore;
pub use stores::metrics::{CacheMetric, MetricsSink, MetricsStore, TracingSink};
pub use stores::moka::{MokaStore, MokaStoreConfig};
pub use stores::redis::{RedisStore, RedisStoreConfig};
pub use swr::{LoadOptions, SwrCache};
pub use tiered::TieredStore;
pub use utils::build_cache_key;
