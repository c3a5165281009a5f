//! Caller-supplied payload validation.
//!
//! The cache treats payloads as opaque JSON. A [`Decoder`] is how each feed
//! states the shape it expects: it turns the raw document into the typed
//! payload, or rejects it. A rejected document is never cached.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::DecodeError;

type DecodeFn<V> = dyn Fn(Value) -> Result<V, DecodeError> + Send + Sync;

/// Converts a JSON document into a feed payload.
pub struct Decoder<V> {
    f: Arc<DecodeFn<V>>,
}

impl<V> Clone for Decoder<V> {
    fn clone(&self) -> Self {
        Decoder { f: Arc::clone(&self.f) }
    }
}

impl<V> fmt::Debug for Decoder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder").finish_non_exhaustive()
    }
}

impl<V: 'static> Decoder<V> {
    /// Custom decoder with arbitrary validation.
    ///
    /// # Example
    /// ```ignore
    /// let slides = Decoder::new(|doc| {
    ///     let slides: Vec<Slide> = serde_json::from_value(doc)
    ///         .map_err(|e| DecodeError::Invalid(e.to_string()))?;
    ///     if slides.is_empty() {
    ///         return Err(DecodeError::Invalid("no slides".into()));
    ///     }
    ///     Ok(slides)
    /// });
    /// ```
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<V, DecodeError> + Send + Sync + 'static,
    {
        Decoder { f: Arc::new(f) }
    }

    /// Run the decoder on a parsed document.
    pub fn decode(&self, doc: Value) -> Result<V, DecodeError> {
        (self.f)(doc)
    }

    /// Parse raw text and decode it.
    pub fn decode_str(&self, body: &str) -> Result<V, DecodeError> {
        let doc: Value = serde_json::from_str(body).map_err(|e| DecodeError::Json(e.to_string()))?;
        self.decode(doc)
    }
}

impl<V: DeserializeOwned + 'static> Decoder<V> {
    /// Deserialize the whole document with serde.
    pub fn serde() -> Self {
        Decoder::new(|doc| serde_json::from_value(doc).map_err(|e| DecodeError::Invalid(e.to_string())))
    }

    /// Deserialize the value found at a JSON pointer, e.g. `/content` or `/items`.
    ///
    /// An empty pointer selects the whole document.
    pub fn at(pointer: impl Into<String>) -> Self {
        let pointer = pointer.into();
        Decoder::new(move |mut doc| {
            let selected = doc
                .pointer_mut(&pointer)
                .map(Value::take)
                .ok_or_else(|| DecodeError::Missing(pointer.clone()))?;
            serde_json::from_value(selected).map_err(|e| DecodeError::Invalid(e.to_string()))
        })
    }
}

impl Decoder<Value> {
    /// Accept any JSON document unchanged.
    pub fn json() -> Self {
        Decoder::new(Ok)
    }
}
