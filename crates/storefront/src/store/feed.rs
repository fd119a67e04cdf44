//! In-process change feed backing live collection subscriptions.

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use souq_core::{CollectionPath, DocumentPath};

/// Default capacity of the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    /// The subscriber fell behind and missed events; re-read the collection.
    Resync,
}

/// A single document change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: DocumentPath,
    pub kind: ChangeKind,
}

/// Fan-out of document changes to subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeFeed {
    /// Create a feed buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn publish(&self, path: &DocumentPath, kind: ChangeKind) {
        let _ = self.tx.send(ChangeEvent {
            path: path.clone(),
            kind,
        });
    }

    /// Subscribe to changes of documents directly inside `collection`.
    #[must_use]
    pub fn subscribe(&self, collection: &CollectionPath) -> Subscription {
        tracing::debug!(collection = %collection, "subscription opened");
        Subscription {
            collection: collection.clone(),
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live view of one collection's changes.
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    collection: CollectionPath,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    /// The collection being watched.
    #[must_use]
    pub const fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    /// Wait for the next change in the watched collection.
    ///
    /// Returns `None` once the store has been dropped. If the subscriber lagged
    /// behind, a single [`ChangeKind::Resync`] event is returned instead of the
    /// missed events.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.collection.contains(&event.path) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        collection = %self.collection,
                        skipped,
                        "subscriber lagged, forcing resync"
                    );
                    let path = self.collection.doc("*").ok()?;
                    return Some(ChangeEvent {
                        path,
                        kind: ChangeKind::Resync,
                    });
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        tracing::debug!(collection = %self.collection, "subscription closed");
    }
}
