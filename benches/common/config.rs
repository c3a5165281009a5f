use std::env;

/// Configuration for benchmarks, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Redis URL for the tiered runs (from REDIS_URL env var; Redis runs are skipped when unset)
    pub redis_url: Option<String>,

    /// Simulated remote latency in milliseconds (from ORIGIN_LATENCY_MS env var, defaults to 50)
    pub origin_latency_ms: u64,

    /// Sample size for benchmarks (from BENCH_SAMPLE_SIZE env var, defaults to 100)
    pub sample_size: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").ok(),
            origin_latency_ms: env::var("ORIGIN_LATENCY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),
            sample_size: env::var("BENCH_SAMPLE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
        }
    }
}

impl BenchConfig {
    pub fn new() -> Self {
        let config = Self::default();
        eprintln!("Benchmark Configuration:");
        eprintln!(
            "  Redis URL: {}",
            config.redis_url.as_deref().unwrap_or("(disabled)")
        );
        eprintln!("  Origin Latency: {}ms", config.origin_latency_ms);
        eprintln!("  Sample Size: {}", config.sample_size);
        config
    }
}
