//! `PostgreSQL`-backed document store.
//!
//! Each document is one row of `storefront.document`, keyed by
//! `(collection, id)` with its body in a JSONB column. Top-level field merges
//! use the JSONB `||` operator.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::types::Json;

use souq_core::{CollectionPath, DocumentPath};

use super::{
    ChangeFeed, ChangeKind, Document, DocumentStore, StoreError, Subscription, ensure_object,
};

/// [`DocumentStore`] over a `PostgreSQL` pool.
///
/// Change events are published to an in-process feed, so subscribers only
/// see writes made through this process. Running several instances against
/// one database needs an external relay (such as `LISTEN`/`NOTIFY`) for live
/// views to stay in sync.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgDocumentStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::default(),
        }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_scalar::<_, Json<Value>>(
            r"
            SELECT data
            FROM storefront.document
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(path.parent().to_string())
        .bind(path.id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|Json(data)| Document {
            path: path.clone(),
            data,
        }))
    }

    async fn create(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError> {
        ensure_object(path, &data)?;
        let result = sqlx::query(
            r"
            INSERT INTO storefront.document (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO NOTHING
            ",
        )
        .bind(path.parent().to_string())
        .bind(path.id())
        .bind(Json(data))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(path.clone()));
        }
        self.feed.publish(path, ChangeKind::Created);
        Ok(())
    }

    async fn set(&self, path: &DocumentPath, data: Value) -> Result<(), StoreError> {
        ensure_object(path, &data)?;
        let inserted: bool = sqlx::query_scalar(
            r"
            INSERT INTO storefront.document (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            RETURNING (xmax = 0) AS inserted
            ",
        )
        .bind(path.parent().to_string())
        .bind(path.id())
        .bind(Json(data))
        .fetch_one(&self.pool)
        .await?;

        let kind = if inserted {
            ChangeKind::Created
        } else {
            ChangeKind::Updated
        };
        self.feed.publish(path, kind);
        Ok(())
    }

    async fn update(
        &self,
        path: &DocumentPath,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.document
            SET data = data || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(path.parent().to_string())
        .bind(path.id())
        .bind(Json(Value::Object(fields)))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(path.clone()));
        }
        self.feed.publish(path, ChangeKind::Updated);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM storefront.document
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(path.parent().to_string())
        .bind(path.id())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            self.feed.publish(path, ChangeKind::Deleted);
        }
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, (String, Json<Value>)>(
            r"
            SELECT id, data
            FROM storefront.document
            WHERE collection = $1
            ORDER BY id
            ",
        )
        .bind(collection.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, Json(data))| {
                Ok(Document {
                    path: collection.doc(&id)?,
                    data,
                })
            })
            .collect()
    }

    fn watch(&self, collection: &CollectionPath) -> Subscription {
        self.feed.subscribe(collection)
    }
}
