use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::CacheError;
use crate::store::Store;

/// Directory name used under the platform cache directory.
const DEFAULT_DIR_NAME: &str = "feed-cache";

/// Temp-file sequence shared by every `FileStore` in the process, so two
/// stores on one directory never pick the same temp path.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Configuration for FileStore.
#[derive(Debug, Clone, Default)]
pub struct FileStoreConfig {
    /// Root directory for entries.
    ///
    /// `None` resolves to `<platform cache dir>/feed-cache`.
    pub dir: Option<PathBuf>,
}

impl FileStoreConfig {
    /// Resolve the root directory, falling back to the platform cache directory.
    pub fn resolve_dir(&self) -> Result<PathBuf, CacheError> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|dir| dir.join(DEFAULT_DIR_NAME))
            .ok_or_else(|| CacheError::Config("could not determine a cache directory".into()))
    }
}

/// Durable store keeping one JSON file per entry.
///
/// This is the persistent, survives-the-process store: entries written by one
/// run are read back by the next. Layout is `<dir>/<namespace>/<key>.json`
/// with both path segments escaped, so any key string maps to exactly one file.
///
/// Writes go to a temporary sibling and are renamed into place, so readers see
/// either the previous entry or the new one, never a torn file.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the configured directory.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(config: FileStoreConfig) -> Result<Self, CacheError> {
        Ok(FileStore {
            dir: config.resolve_dir()?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.dir
            .join(escape_segment(namespace))
            .join(format!("{}.json", escape_segment(key)))
    }
}

/// Escape a string into a single safe path segment.
///
/// ASCII alphanumerics, `-` and `_` pass through; every other byte becomes `%XX`.
fn escape_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

#[async_trait]
impl Store for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.entry_path(namespace, key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::operation(
                "file",
                key,
                format!("read {} failed: {}", path.display(), e),
            )),
        }
    }

    async fn set(&self, namespace: &str, key: &str, value: String) -> Result<(), CacheError> {
        let path = self.entry_path(namespace, key);
        let parent = path.parent().unwrap_or(&self.dir);

        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            CacheError::operation(
                "file",
                key,
                format!("create {} failed: {}", parent.display(), e),
            )
        })?;

        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.tmp-{}-{}", std::process::id(), seq));

        if let Err(e) = tokio::fs::write(&tmp, value.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::operation(
                "file",
                key,
                format!("write {} failed: {}", tmp.display(), e),
            ));
        }

        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            CacheError::operation(
                "file",
                key,
                format!("rename into {} failed: {}", path.display(), e),
            )
        })
    }

    async fn remove(&self, namespace: &str, keys: &[&str]) -> Result<(), CacheError> {
        for key in keys {
            let path = self.entry_path(namespace, key);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CacheError::operation(
                        "file",
                        *key,
                        format!("remove {} failed: {}", path.display(), e),
                    ));
                }
            }
        }
        Ok(())
    }
}
