//! Catalog loading.
//!
//! The catalog is read-only from the storefront's point of view, so listings
//! are cached per collection with `moka`.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use souq_core::{CollectionPath, ProductId};

use super::facets::{FacetFilter, filter_products};
use crate::models::Product;
use crate::store::{DocumentStore, StoreError};

/// Errors that can occur when reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The collection holds no products.
    #[error("No products found in this category")]
    Empty(CollectionPath),

    /// The product is not in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Store access failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Cached, normalized access to catalog collections.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    store: Arc<dyn DocumentStore>,
    default_collection: CollectionPath,
    cache: Cache<CollectionPath, Arc<Vec<Product>>>,
}

impl CatalogService {
    /// Create a catalog over `store`, listing `default_collection` unless told
    /// otherwise and caching each listing for `ttl`.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        default_collection: CollectionPath,
        ttl: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                store,
                default_collection,
                cache,
            }),
        }
    }

    /// The collection served by [`CatalogService::products`].
    #[must_use]
    pub fn default_collection(&self) -> &CollectionPath {
        &self.inner.default_collection
    }

    /// Load and normalize every product in a collection.
    ///
    /// Documents whose key is not a usable product id are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` if the collection holds no products.
    #[instrument(skip(self), fields(collection = %collection))]
    pub async fn load(&self, collection: &CollectionPath) -> Result<Arc<Vec<Product>>, CatalogError> {
        if let Some(products) = self.inner.cache.get(collection).await {
            debug!("Cache hit for catalog collection");
            return Ok(products);
        }

        let docs = self.inner.store.list(collection).await?;
        let products: Vec<Product> = docs
            .iter()
            .filter_map(|doc| match Product::from_document(doc) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(path = %doc.path, error = %e, "Skipping unreadable catalog document");
                    None
                }
            })
            .collect();

        if products.is_empty() {
            return Err(CatalogError::Empty(collection.clone()));
        }

        let products = Arc::new(products);
        self.inner
            .cache
            .insert(collection.clone(), Arc::clone(&products))
            .await;
        debug!(count = products.len(), "Loaded catalog collection");

        Ok(products)
    }

    /// Products of the default collection.
    ///
    /// # Errors
    ///
    /// See [`CatalogService::load`].
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        self.load(&self.inner.default_collection).await
    }

    /// Products of the default collection that pass `filter`.
    ///
    /// # Errors
    ///
    /// See [`CatalogService::load`].
    pub async fn filtered(&self, filter: &FacetFilter) -> Result<Vec<Product>, CatalogError> {
        let products = self.products().await?;
        Ok(filter_products(&products, filter))
    }

    /// Look up a product of the default collection by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` if no product has that id.
    pub async fn find(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let products = self.products().await.map_err(|e| match e {
            CatalogError::Empty(_) => CatalogError::ProductNotFound(id.clone()),
            other => other,
        })?;
        products
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::ProductNotFound(id.clone()))
    }

    /// Drop every cached listing.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}
