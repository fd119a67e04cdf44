//! Process-local document store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use souq_core::{CollectionPath, DocumentPath};

use super::{
    ChangeFeed, ChangeKind, Document, DocumentStore, StoreError, Subscription, ensure_object,
};

/// In-memory [`DocumentStore`].
///
/// Cheaply cloneable; clones share the same documents and change feed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    docs: RwLock<BTreeMap<DocumentPath, Value>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents across all collections.
    pub async fn len(&self) -> usize {
        self.inner.docs.read().await.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.inner.docs.read().await.is_empty()
    }

    /// The store's change feed.
    #[must_use]
    pub fn feed(&self) -> &ChangeFeed {
        &self.inner.feed
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let docs = self.inner.docs.read().await;
        Ok(docs.get(path).map(|data| Document {
            path: path.clone(),
            data: data.clone(),
        }))
    }

    async fn create(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError> {
        ensure_object(path, &data)?;
        {
            let mut docs = self.inner.docs.write().await;
            if docs.contains_key(path) {
                return Err(StoreError::AlreadyExists(path.clone()));
            }
            docs.insert(path.clone(), data);
        }
        self.inner.feed.publish(path, ChangeKind::Created);
        Ok(())
    }

    async fn set(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError> {
        ensure_object(path, &data)?;
        let existed = self
            .inner
            .docs
            .write()
            .await
            .insert(path.clone(), data)
            .is_some();
        let kind = if existed {
            ChangeKind::Updated
        } else {
            ChangeKind::Created
        };
        self.inner.feed.publish(path, kind);
        Ok(())
    }

    async fn update(
        &self,
        path: &DocumentPath,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        {
            let mut docs = self.inner.docs.write().await;
            let doc = docs
                .get_mut(path)
                .and_then(Value::as_object_mut)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;
            doc.extend(fields);
        }
        self.inner.feed.publish(path, ChangeKind::Updated);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let removed = self.inner.docs.write().await.remove(path).is_some();
        if removed {
            self.inner.feed.publish(path, ChangeKind::Deleted);
        }
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let docs = self.inner.docs.read().await;
        Ok(docs
            .iter()
            .filter(|(path, _)| collection.contains(path))
            .map(|(path, data)| Document {
                path: path.clone(),
                data: data.clone(),
            })
            .collect())
    }

    fn watch(&self, collection: &CollectionPath) -> Subscription {
        self.inner.feed.subscribe(collection)
    }
}
