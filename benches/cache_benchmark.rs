use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use feed_cache::{
    Decoder, FileStore, FileStoreConfig, HashMapStore, LoadOptions, MokaStore, MokaStoreConfig,
    RedisStore, RedisStoreConfig, Store, SwrCache, TieredStore,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

mod common;
use common::{BenchConfig, FakeOrigin, KeyGenerator};

const TTL: Duration = Duration::from_secs(600);

fn decoder() -> Decoder<Vec<Value>> {
    Decoder::at("/content")
}

fn options(origin: &FakeOrigin, key: &str) -> LoadOptions<Vec<Value>> {
    LoadOptions::new(TTL, origin.source(key), decoder())
}

/// A cache plus whatever must outlive it.
struct Setup {
    name: &'static str,
    cache: SwrCache,
    _dir: Option<TempDir>,
}

/// Memory only
fn setup_memory() -> Setup {
    Setup {
        name: "memory",
        cache: SwrCache::new("bench", Arc::new(HashMapStore::new())),
        _dir: None,
    }
}

/// MokaStore + FileStore tier
fn setup_moka_file() -> Setup {
    let dir = tempfile::tempdir().expect("failed to create bench dir");
    let moka: Arc<dyn Store> = Arc::new(MokaStore::new(MokaStoreConfig::default()));
    let file: Arc<dyn Store> = Arc::new(
        FileStore::new(FileStoreConfig {
            dir: Some(dir.path().to_path_buf()),
        })
        .expect("failed to open file store"),
    );

    Setup {
        name: "moka_file",
        cache: SwrCache::new("bench", Arc::new(TieredStore::from_stores(vec![moka, file]))),
        _dir: Some(dir),
    }
}

/// MokaStore + Redis tier
async fn setup_moka_redis(redis_url: &str) -> Setup {
    let moka: Arc<dyn Store> = Arc::new(MokaStore::new(MokaStoreConfig::default()));
    let redis: Arc<dyn Store> = Arc::new(
        RedisStore::new(RedisStoreConfig {
            url: redis_url.to_string(),
            expire_after: None,
        })
        .await
        .expect("Redis connection failed"),
    );

    Setup {
        name: "moka_redis",
        cache: SwrCache::new("bench", Arc::new(TieredStore::from_stores(vec![moka, redis]))),
        _dir: None,
    }
}

fn setups(rt: &Runtime, config: &BenchConfig) -> Vec<Setup> {
    let mut setups = vec![setup_memory(), setup_moka_file()];
    if let Some(url) = &config.redis_url {
        setups.push(rt.block_on(setup_moka_redis(url)));
    }
    setups
}

/// Load every key once and wait for it to be persisted.
async fn warm(cache: &SwrCache, origin: &FakeOrigin, keys: &[String]) {
    for key in keys {
        let mut loaded = cache
            .load(key, options(origin, key))
            .await
            .expect("load failed");
        if let Some(handle) = loaded.revalidation() {
            handle.finished().await;
        }
    }
}

/// Benchmark 1: Hot Cache (fresh entries, time to the initial snapshot)
fn bench_hot_cache(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("hot_cache");
    group.sample_size(config.sample_size);

    let origin = FakeOrigin::new(100, config.origin_latency_ms);
    let keys = KeyGenerator::new(100).sequential();
    group.throughput(Throughput::Elements(keys.len() as u64));

    for setup in setups(&rt, config) {
        rt.block_on(warm(&setup.cache, &origin, &keys));
        let decoder = decoder();

        group.bench_with_input(BenchmarkId::new("cached", setup.name), &setup, |b, setup| {
            b.to_async(&rt).iter(|| async {
                for key in &keys {
                    let _ = black_box(setup.cache.get(key, &decoder).await);
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("load", setup.name), &setup, |b, setup| {
            b.to_async(&rt).iter(|| async {
                for key in &keys {
                    let loaded = setup.cache.load(key, options(&origin, key)).await;
                    let _ = black_box(loaded.map(|l| l.initial().is_some()));
                }
            });
        });
    }

    group.finish();
}

/// Benchmark 2: Cold Cache (empty store, wait for the network update)
fn bench_cold_cache(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cold_cache");
    group.sample_size(config.sample_size.min(20)); // Fewer samples due to origin latency
    group.measurement_time(Duration::from_secs(30));

    let origin = FakeOrigin::new(10, config.origin_latency_ms);
    let keys = KeyGenerator::new(10).sequential();

    for setup in setups(&rt, config) {
        group.bench_function(setup.name, |b| {
            b.to_async(&rt).iter(|| async {
                for key in &keys {
                    let _ = setup.cache.remove(key).await;
                    let mut loaded = setup
                        .cache
                        .load(key, options(&origin, key))
                        .await
                        .expect("load failed");
                    let _ = black_box(loaded.updated().await);
                }
            });
        });
    }

    group.finish();
}

/// Benchmark 3: Mixed Workload (80% of requests on warm feeds)
fn bench_mixed_workload(c: &mut Criterion, config: &BenchConfig) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("mixed_workload");
    group.sample_size(config.sample_size.min(50));

    let origin = FakeOrigin::new(500, config.origin_latency_ms);
    let key_gen = KeyGenerator::new(500);
    let hot: Vec<String> = key_gen.sequential().into_iter().take(400).collect();

    for setup in setups(&rt, config) {
        rt.block_on(warm(&setup.cache, &origin, &hot));

        group.bench_function(setup.name, |b| {
            b.to_async(&rt).iter(|| {
                let keys = key_gen.mixed(0.8);
                let cache = setup.cache.clone();
                let origin = origin.clone();
                async move {
                    for key in keys.iter().take(50) {
                        let loaded = cache.load(key, options(&origin, key)).await;
                        let _ = black_box(loaded.map(|l| l.initial().is_some()));
                    }
                }
            });
        });
    }

    group.finish();
}

fn run_benchmarks(c: &mut Criterion) {
    let config = BenchConfig::new();

    eprintln!("\n=== Running Benchmarks ===\n");

    bench_hot_cache(c, &config);
    bench_cold_cache(c, &config);
    bench_mixed_workload(c, &config);
}

criterion_group!(benches, run_benchmarks);
criterion_main!(benches);
