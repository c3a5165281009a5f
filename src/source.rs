//! Where feed documents come from.
//!
//! A [`Source`] produces the raw text of one JSON document. The remote
//! endpoint of a feed and its bundled fallback are both sources; the cache
//! only decides which one to call and when.

use async_trait::async_trait;
use reqwest::{Client, header};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CacheError, FetchError};

/// HTTP request timeout used when no client is supplied.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum length for error response bodies kept in a [`FetchError::Status`].
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Produces the raw text of a JSON document.
///
/// Implementations perform a single attempt: no retries, no caching.
#[async_trait]
pub trait Source: Send + Sync {
    /// Human-readable origin for logs (a URL, a path, ...).
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<String, FetchError>;
}

impl FetchError {
    /// Build a status error, truncating the body so logs stay readable.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut cut = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..cut],
                body.len()
            )
        };
        FetchError::Status { status, body }
    }
}

/// GET a JSON document over HTTP(S).
///
/// Clone is cheap: `reqwest::Client` shares its connection pool.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    /// Create a source with its own client and the default timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, CacheError> {
        Self::with_timeout(url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, CacheError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, url))
    }

    /// Share an existing client (and its connection pool) across sources.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        HttpSource {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Source for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16(), &body));
        }

        Ok(body)
    }
}

/// Read a bundled JSON file from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

#[async_trait]
impl Source for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FetchError::Io {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
    }
}

/// A document compiled into the program.
#[derive(Debug, Clone)]
pub struct StaticSource {
    body: String,
}

impl StaticSource {
    pub fn new(body: impl Into<String>) -> Self {
        StaticSource { body: body.into() }
    }

    pub fn json(value: &serde_json::Value) -> Self {
        StaticSource {
            body: value.to_string(),
        }
    }
}

#[async_trait]
impl Source for StaticSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        Ok(self.body.clone())
    }
}

/// Adapt an async closure into a [`Source`].
///
/// # Example
/// ```ignore
/// let remote = FnSource::new("sheet", || async {
///     Ok(r#"{"content": []}"#.to_string())
/// });
/// ```
pub struct FnSource<F> {
    label: String,
    f: F,
}

impl<F, Fut> FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, FetchError>> + Send,
{
    pub fn new(label: impl Into<String>, f: F) -> Self {
        FnSource {
            label: label.into(),
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> Source for FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, FetchError>> + Send,
{
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        (self.f)().await
    }
}
