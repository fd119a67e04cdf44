//! Document store access.
//!
//! # Layout
//!
//! ```text
//! users/{userId}/cart/{productId}        - one cart line per product
//! users/{userId}/favorites/{productId}   - one wishlist entry per product
//! favorites/{userId}/items/{productId}   - legacy wishlist layout (migration source only)
//! {category}/{...}/{subcategory}/{id}    - read-only catalog
//! ```
//!
//! # Implementations
//!
//! - [`MemoryStore`] - process-local, used when no database is configured and in tests
//! - [`PgDocumentStore`] - `PostgreSQL` JSONB rows keyed by (collection, id)
//!
//! Both publish every successful write to a [`ChangeFeed`], which backs the
//! live [`Subscription`]s used by the cart and wishlist event streams.

mod feed;
pub mod layout;
mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, stream};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use souq_core::{CollectionPath, DocumentPath, PathError};

pub use feed::{ChangeEvent, ChangeFeed, ChangeKind, Subscription};
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// Errors that can occur when talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A create targeted a key that already holds a document.
    #[error("document already exists: {0}")]
    AlreadyExists(DocumentPath),

    /// An update targeted a missing document.
    #[error("document not found: {0}")]
    NotFound(DocumentPath),

    /// The document body is not a JSON object.
    #[error("document {0} must be a JSON object")]
    NotAnObject(DocumentPath),

    /// A path could not be built.
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// Encoding or decoding a document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Where the document lives.
    pub path: DocumentPath,
    /// The document body (always a JSON object).
    pub data: Value,
}

impl Document {
    /// The document key.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Deserialize the body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(T::deserialize(&self.data)?)
    }
}

/// Keyed document CRUD plus live collection subscriptions.
///
/// Writes are last-write-wins, except [`DocumentStore::create`], which is an
/// atomic insert-if-absent.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Insert a document, failing with `StoreError::AlreadyExists` if the key is taken.
    async fn create(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError>;

    /// Insert or overwrite a document.
    async fn set(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError>;

    /// Merge top-level fields into an existing document.
    ///
    /// Fails with `StoreError::NotFound` if the document is missing.
    async fn update(&self, path: &DocumentPath, fields: Map<String, Value>)
    -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;

    /// Read every document directly inside a collection, ordered by key.
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError>;

    /// Subscribe to changes of documents directly inside a collection.
    ///
    /// The subscription ends when the returned handle is dropped.
    fn watch(&self, collection: &CollectionPath) -> Subscription;
}

/// Live snapshots of a collection.
///
/// Yields the current contents immediately, then a fresh read after every
/// change. The stream ends when the store shuts down, and dropping it
/// unsubscribes.
pub fn snapshots(
    store: Arc<dyn DocumentStore>,
    collection: CollectionPath,
) -> impl Stream<Item = Result<Vec<Document>, StoreError>> + Send + 'static {
    // Subscribe before the first read so no change falls between the two.
    let subscription = store.watch(&collection);
    stream::unfold(
        (store, collection, subscription, true),
        |(store, collection, mut subscription, initial)| async move {
            if !initial {
                subscription.next().await?;
            }
            let snapshot = store.list(&collection).await;
            Some((snapshot, (store, collection, subscription, false)))
        },
    )
}

/// Reject document bodies that are not JSON objects.
fn ensure_object(path: &DocumentPath, data: &Value) -> Result<(), StoreError> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject(path.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Line {
        quantity: u32,
    }

    #[test]
    fn test_document_decode() {
        let doc = Document {
            path: DocumentPath::parse("users/u1/cart/p1").unwrap(),
            data: json!({ "quantity": 2 }),
        };
        assert_eq!(doc.id(), "p1");
        assert_eq!(doc.decode::<Line>().unwrap(), Line { quantity: 2 });
    }

    #[test]
    fn test_document_decode_mismatch() {
        let doc = Document {
            path: DocumentPath::parse("users/u1/cart/p1").unwrap(),
            data: json!({ "quantity": "lots" }),
        };
        assert!(matches!(
            doc.decode::<Line>(),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_ensure_object() {
        let path = DocumentPath::parse("a/b").unwrap();
        assert!(ensure_object(&path, &json!({})).is_ok());
        assert!(matches!(
            ensure_object(&path, &json!([1, 2])),
            Err(StoreError::NotAnObject(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshots_initial_then_on_change() {
        use futures::StreamExt;

        let store = Arc::new(MemoryStore::new());
        let cart = CollectionPath::parse("users/u1/cart").unwrap();
        store
            .set(&cart.doc("p1").unwrap(), json!({ "quantity": 1 }))
            .await
            .unwrap();

        let mut stream = Box::pin(snapshots(store.clone(), cart.clone()));
        let initial = stream.next().await.unwrap().unwrap();
        assert_eq!(initial.len(), 1);

        store
            .set(&cart.doc("p2").unwrap(), json!({ "quantity": 3 }))
            .await
            .unwrap();
        let next = stream.next().await.unwrap().unwrap();
        assert_eq!(next.len(), 2);

        drop(stream);
        assert_eq!(store.feed().subscriber_count(), 0);
    }
}
