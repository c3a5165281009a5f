use feed_cache::{FetchError, FnSource, Source};
use rand::Rng;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A navigation-menu sized document.
pub fn menu_document(id: usize) -> Value {
    let items: Vec<Value> = (0..20)
        .map(|i| {
            json!({
                "title": format!("Committee {} / {}", id, i),
                "href": format!("/committees/{}/{}", id, i),
            })
        })
        .collect();
    json!({ "content": items })
}

/// Simulated remote endpoint with configurable latency
#[derive(Clone)]
pub struct FakeOrigin {
    documents: Arc<HashMap<String, String>>,
    latency_ms: u64,
    fetch_count: Arc<AtomicUsize>,
}

impl FakeOrigin {
    pub fn new(num_feeds: usize, latency_ms: u64) -> Self {
        let documents = (0..num_feeds)
            .map(|i| (format!("feed:{}", i), menu_document(i).to_string()))
            .collect();

        Self {
            documents: Arc::new(documents),
            latency_ms,
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The remote source for one feed key.
    pub fn source(&self, key: &str) -> Arc<dyn Source> {
        let origin = self.clone();
        let key = key.to_string();
        Arc::new(FnSource::new(format!("fake:{}", key), move || {
            let origin = origin.clone();
            let key = key.clone();
            async move { origin.fetch(&key).await }
        }))
    }

    pub async fn fetch(&self, key: &str) -> Result<String, FetchError> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);

        // Simulate network latency
        tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;

        self.documents
            .get(key)
            .cloned()
            .ok_or_else(|| FetchError::from_status(404, "not found"))
    }

    #[allow(dead_code)]
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

/// Generate feed keys for different workload patterns
pub struct KeyGenerator {
    num_keys: usize,
}

impl KeyGenerator {
    pub fn new(num_keys: usize) -> Self {
        Self { num_keys }
    }

    /// Generate sequential keys
    pub fn sequential(&self) -> Vec<String> {
        (0..self.num_keys).map(|i| format!("feed:{}", i)).collect()
    }

    /// Generate keys where `hit_ratio` of requests go to the first `hit_ratio` share of feeds
    pub fn mixed(&self, hit_ratio: f64) -> Vec<String> {
        let mut rng = rand::thread_rng();
        let hot_key_count = ((self.num_keys as f64 * hit_ratio) as usize).max(1);

        (0..1000)
            .map(|_| {
                if rng.gen_bool(hit_ratio) || hot_key_count >= self.num_keys {
                    format!("feed:{}", rng.gen_range(0..hot_key_count))
                } else {
                    format!("feed:{}", rng.gen_range(hot_key_count..self.num_keys))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    async fn test_fake_origin() {
        use super::FakeOrigin;

        let origin = FakeOrigin::new(10, 1);

        let body = origin.fetch("feed:0").await.unwrap();
        assert!(body.contains("Committee 0"));
        assert!(origin.fetch("feed:99").await.is_err());

        assert_eq!(origin.fetch_count(), 2);
    }

    #[test]
    fn test_key_generator() {
        use super::KeyGenerator;

        let key_gen = KeyGenerator::new(100);

        let seq = key_gen.sequential();
        assert_eq!(seq.len(), 100);
        assert_eq!(seq[0], "feed:0");

        let mixed = key_gen.mixed(0.8);
        assert_eq!(mixed.len(), 1000);
    }
}
