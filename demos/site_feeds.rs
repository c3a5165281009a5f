//! Load every feed of a site config and print what a page would render.
//!
//! ```text
//! cargo run --example site_feeds -- demos/site_feeds.json
//! RUST_LOG=feed_cache=debug cargo run --example site_feeds -- demos/site_feeds.json
//! ```
//!
//! The first run has nothing cached and shows the bundled fallbacks (or
//! nothing, for feeds without one). Later runs within a feed's TTL show the
//! cached content straight away.

use anyhow::Context;
use feed_cache::{CacheConfig, Decoder, Snapshot};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn describe(snapshot: Option<&Snapshot<Value>>) -> String {
    match snapshot {
        Some(s) => format!("{:?} (fetched at {}): {}", s.source, s.fetched_at, s.payload),
        None => "loading...".to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/site_feeds.json".to_string());

    let mut config = CacheConfig::from_path(&path).with_context(|| format!("loading {}", path))?;
    config.apply_env();
    let registry = config.build().await.context("building feed registry")?;

    let names: Vec<String> = registry.names().map(str::to_string).collect();
    for name in names {
        let feed = registry.feed(&name, Decoder::<Value>::json())?;
        let mut loaded = feed.load().await?;
        println!("[{}] initial: {}", name, describe(loaded.initial()));

        match loaded.updated().await {
            Some(update) => println!("[{}] updated: {}", name, describe(Some(&update))),
            None => println!("[{}] no update, keeping what is shown", name),
        }
    }

    Ok(())
}
