//! What a caller gets back from a load.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Where a snapshot's payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Cached entry younger than the feed's TTL.
    Fresh,
    /// Cached entry at or past the TTL, shown while revalidating.
    Stale,
    /// Bundled fallback document. Never persisted.
    Fallback,
    /// Just fetched from the remote endpoint and persisted.
    Network,
}

/// The payload a caller should currently render.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<V> {
    pub payload: V,
    /// Unix milliseconds at which the payload was fetched (or synthesized, for a fallback).
    pub fetched_at: i64,
    pub source: SnapshotSource,
}

/// How the background network step of a load ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidationOutcome {
    /// The remote payload decoded and was persisted.
    Revalidated,
    /// The remote payload decoded but persisting it failed. The update was still emitted.
    StoreFailed(String),
    /// The remote endpoint could not be reached or answered with an error.
    FetchFailed(String),
    /// The remote document was malformed or rejected by the decoder.
    DecodeFailed(String),
    /// The background task panicked or was aborted by the runtime.
    Aborted,
}

impl RevalidationOutcome {
    /// Whether the store now holds the remote payload.
    pub fn persisted(&self) -> bool {
        matches!(self, RevalidationOutcome::Revalidated)
    }
}

/// Awaitable handle on the background network step.
///
/// Dropping it does not cancel the step.
pub struct RevalidationHandle {
    pub(crate) task: JoinHandle<RevalidationOutcome>,
}

impl RevalidationHandle {
    /// Wait for the background step to finish.
    pub async fn finished(self) -> RevalidationOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "revalidation task did not complete");
                RevalidationOutcome::Aborted
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Result of one `load()`: the initial snapshot plus a subscription to the
/// single update the background step may produce.
///
/// Dropping a `Loaded` (or calling [`Loaded::unsubscribe`]) only stops the
/// caller from receiving the update. The background fetch and the store
/// write still run to completion.
pub struct Loaded<V> {
    initial: Option<Snapshot<V>>,
    update: Option<oneshot::Receiver<Snapshot<V>>>,
    latest: Option<Snapshot<V>>,
    revalidation: Option<RevalidationHandle>,
}

impl<V: Clone> Loaded<V> {
    pub(crate) fn new(
        initial: Option<Snapshot<V>>,
        update: oneshot::Receiver<Snapshot<V>>,
        revalidation: RevalidationHandle,
    ) -> Self {
        Loaded {
            latest: initial.clone(),
            initial,
            update: Some(update),
            revalidation: Some(revalidation),
        }
    }

    /// Snapshot available before any network I/O. `None` means loading.
    pub fn initial(&self) -> Option<&Snapshot<V>> {
        self.initial.as_ref()
    }

    /// Move the initial snapshot out, e.g. to hand it to a renderer.
    ///
    /// `current()` still reports it until an update arrives.
    pub fn take_initial(&mut self) -> Option<Snapshot<V>> {
        self.initial.take()
    }

    /// Best snapshot observed so far through this handle.
    pub fn current(&self) -> Option<&Snapshot<V>> {
        self.latest.as_ref()
    }

    /// Wait for the updated snapshot.
    ///
    /// Resolves to `None` once the background step ended without a usable
    /// payload, and on every call after the one that resolved.
    ///
    /// Cancel safe: dropping the future (e.g. under `tokio::time::timeout` or
    /// in a `select!`) keeps the subscription, so a later call still receives
    /// the update.
    pub async fn updated(&mut self) -> Option<Snapshot<V>> {
        let receiver = self.update.as_mut()?;
        let received = receiver.await;
        self.update = None;
        match received {
            Ok(snapshot) => {
                self.latest = Some(snapshot.clone());
                Some(snapshot)
            }
            Err(_) => None,
        }
    }

    /// Take the handle on the background step, e.g. to wait for persistence.
    ///
    /// Returns `None` if it was already taken.
    pub fn revalidation(&mut self) -> Option<RevalidationHandle> {
        self.revalidation.take()
    }

    /// Stop listening for the update. The background step keeps running.
    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn snapshot(payload: &str, fetched_at: i64, source: SnapshotSource) -> Snapshot<String> {
        Snapshot {
            payload: payload.to_string(),
            fetched_at,
            source,
        }
    }

    fn finished_task(outcome: RevalidationOutcome) -> RevalidationHandle {
        RevalidationHandle {
            task: tokio::spawn(async move { outcome }),
        }
    }

    #[tokio::test]
    async fn test_update_replaces_current() {
        let (tx, rx) = oneshot::channel();
        let mut loaded = Loaded::new(
            Some(snapshot("cached", 1, SnapshotSource::Stale)),
            rx,
            finished_task(RevalidationOutcome::Revalidated),
        );
        assert_eq!(loaded.current().unwrap().payload, "cached");

        tx.send(snapshot("fresh", 2, SnapshotSource::Network)).unwrap();
        let update = loaded.updated().await.unwrap();
        assert_eq!(update.payload, "fresh");
        assert_eq!(loaded.current().unwrap().source, SnapshotSource::Network);
        assert_eq!(loaded.initial().unwrap().payload, "cached");

        // Only one update per load.
        assert!(loaded.updated().await.is_none());
    }

    #[tokio::test]
    async fn test_timed_out_wait_keeps_subscription() {
        let (tx, rx) = oneshot::channel();
        let mut loaded = Loaded::new(
            Some(snapshot("cached", 1, SnapshotSource::Stale)),
            rx,
            finished_task(RevalidationOutcome::Revalidated),
        );

        let waited = tokio::time::timeout(Duration::from_millis(10), loaded.updated()).await;
        assert!(waited.is_err());

        tx.send(snapshot("fresh", 2, SnapshotSource::Network)).unwrap();
        let update = loaded.updated().await.unwrap();
        assert_eq!(update.payload, "fresh");
        assert_eq!(loaded.current().unwrap().payload, "fresh");
        assert!(loaded.updated().await.is_none());
    }

    #[tokio::test]
    async fn test_take_initial_keeps_current() {
        let (_tx, rx) = oneshot::channel();
        let mut loaded = Loaded::new(
            Some(snapshot("bundled", 5, SnapshotSource::Fallback)),
            rx,
            finished_task(RevalidationOutcome::Revalidated),
        );

        assert_eq!(loaded.take_initial().unwrap().payload, "bundled");
        assert!(loaded.initial().is_none());
        assert_eq!(loaded.current().unwrap().payload, "bundled");
    }

    #[tokio::test]
    async fn test_closed_channel_means_no_update() {
        let (tx, rx) = oneshot::channel::<Snapshot<String>>();
        let mut loaded = Loaded::new(None, rx, finished_task(RevalidationOutcome::Aborted));
        drop(tx);

        assert!(loaded.updated().await.is_none());
        assert!(loaded.current().is_none());
    }

    #[tokio::test]
    async fn test_revalidation_handle_reports_outcome() {
        let (_tx, rx) = oneshot::channel::<Snapshot<String>>();
        let mut loaded = Loaded::new(
            None,
            rx,
            finished_task(RevalidationOutcome::FetchFailed("offline".into())),
        );

        let handle = loaded.revalidation().unwrap();
        let outcome = handle.finished().await;
        assert_eq!(outcome, RevalidationOutcome::FetchFailed("offline".into()));
        assert!(!outcome.persisted());
        assert!(loaded.revalidation().is_none());
    }
}
