/// Error type for cache and registry operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// A store operation failed.
    #[error("[{tier}] cache error for key '{key}': {message}")]
    Operation {
        tier: String,
        key: String,
        message: String,
    },
    /// Serialization or deserialization of a persisted entry failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The cache key was rejected before any I/O happened.
    #[error("Invalid cache key '{0}': keys must be non-empty")]
    InvalidKey(String),
    /// Two feeds were registered under the same cache key.
    #[error("Feeds '{first}' and '{second}' share the cache key '{key}'")]
    KeyCollision {
        key: String,
        first: String,
        second: String,
    },
    /// A feed name was registered twice.
    #[error("Feed '{0}' is registered more than once")]
    DuplicateFeed(String),
    /// No feed with this name exists in the registry.
    #[error("Feed '{0}' not found")]
    UnknownFeed(String),
    /// Configuration could not be read or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Create a new operation error.
    pub fn operation(
        tier: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Operation {
            tier: tier.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failure of a [`Source`](crate::Source) to produce a document.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),
    /// The endpoint answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    /// A local file could not be read.
    #[error("failed to read '{path}': {message}")]
    Io { path: String, message: String },
    /// A caller-provided fetch function failed.
    #[error("{0}")]
    Closure(String),
}

/// A document was fetched but does not have the shape the caller expects.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    /// The body is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(String),
    /// The JSON pointer selected nothing.
    #[error("no value at '{0}'")]
    Missing(String),
    /// The value exists but failed validation.
    #[error("invalid payload: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_error_display() {
        let err = CacheError::operation("file", "navbar", "permission denied");
        assert_eq!(
            err.to_string(),
            "[file] cache error for key 'navbar': permission denied"
        );
    }

    #[test]
    fn test_key_collision_display() {
        let err = CacheError::KeyCollision {
            key: "home".into(),
            first: "homepage".into(),
            second: "slides".into(),
        };
        assert_eq!(
            err.to_string(),
            "Feeds 'homepage' and 'slides' share the cache key 'home'"
        );
    }
}
