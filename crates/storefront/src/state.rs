//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::{
    CartService, CatalogService, CheckoutService, IdentityVerifier, WishlistService,
};
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the services built on the document store and to configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    catalog: CatalogService,
    cart: CartService,
    wishlist: WishlistService,
    checkout: CheckoutService,
    identity: Option<IdentityVerifier>,
}

impl AppState {
    /// Create state backed by `PostgreSQL`.
    #[must_use]
    pub fn with_pool(config: StorefrontConfig, pool: PgPool) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(pool.clone()));
        Self::build(config, Some(pool), store)
    }

    /// Create state backed by a process-local store.
    #[must_use]
    pub fn in_memory(config: StorefrontConfig, store: MemoryStore) -> Self {
        Self::build(config, None, Arc::new(store))
    }

    fn build(config: StorefrontConfig, pool: Option<PgPool>, store: Arc<dyn DocumentStore>) -> Self {
        let catalog = CatalogService::new(
            Arc::clone(&store),
            config.catalog_collection.clone(),
            config.catalog_ttl,
        );
        let cart = CartService::new(Arc::clone(&store));
        let wishlist = WishlistService::new(Arc::clone(&store), cart.clone());
        let checkout = CheckoutService::new(cart.clone());
        let identity = config.identity_secret.clone().map(IdentityVerifier::new);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                cart,
                wishlist,
                checkout,
                identity,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The database pool, when running against `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistService {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// Identity signature checks, when an identity secret is configured.
    #[must_use]
    pub fn identity(&self) -> Option<&IdentityVerifier> {
        self.inner.identity.as_ref()
    }
}
