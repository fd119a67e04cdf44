//! Wishlist (favorites) operations.
//!
//! Favorites live at `users/{userId}/favorites/{productId}`. Documents under
//! the older `favorites/{userId}/items` layout are only read by
//! [`WishlistService::migrate_legacy_favorites`].

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use souq_core::{PathError, ProductId, UserId};

use super::cart::{CartError, CartService};
use crate::models::{CartItem, FavoriteItem, Product};
use crate::store::{self, DocumentStore, StoreError, layout};

/// Errors that can occur during wishlist operations.
#[derive(Debug, Error)]
pub enum WishlistError {
    /// The product is already on the wishlist.
    #[error("already in wishlist")]
    AlreadyFavorite(ProductId),

    /// The product is not on the wishlist.
    #[error("not in wishlist: {0}")]
    NotFavorite(ProductId),

    /// Moving to the cart failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A wishlist path could not be built from the ids.
    #[error("invalid wishlist path: {0}")]
    Path(#[from] PathError),

    /// Store access failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of moving legacy favorites into the current layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Copied into the current layout.
    pub migrated: usize,
    /// Already present in the current layout.
    pub skipped: usize,
    /// Unreadable; left in place.
    pub failed: usize,
}

/// Wishlist operations over a document store.
#[derive(Clone)]
pub struct WishlistService {
    store: Arc<dyn DocumentStore>,
    cart: CartService,
}

impl WishlistService {
    /// Create a wishlist service. Moving items to the cart goes through `cart`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, cart: CartService) -> Self {
        Self { store, cart }
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::AlreadyFavorite` if it is already there.
    #[instrument(skip(self, product), fields(user = %user, product = %product.id))]
    pub async fn add_to_wishlist(
        &self,
        user: &UserId,
        product: &Product,
    ) -> Result<FavoriteItem, WishlistError> {
        let item = FavoriteItem::from_product(product);
        let path = layout::favorite_item(user, &item.id)?;
        match self.store.create(&path, item.to_document()?).await {
            Ok(()) => Ok(item),
            Err(StoreError::AlreadyExists(_)) => Err(WishlistError::AlreadyFavorite(item.id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a product from the wishlist. Removing a missing entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::Store` if the delete fails.
    #[instrument(skip(self), fields(user = %user, product = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        user: &UserId,
        product_id: &ProductId,
    ) -> Result<(), WishlistError> {
        let path = layout::favorite_item(user, product_id)?;
        self.store.delete(&path).await?;
        Ok(())
    }

    /// Whether the product is on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::Store` if the read fails.
    pub async fn is_favorite(
        &self,
        user: &UserId,
        product_id: &ProductId,
    ) -> Result<bool, WishlistError> {
        let path = layout::favorite_item(user, product_id)?;
        Ok(self.store.get(&path).await?.is_some())
    }

    /// Every wishlist entry.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::Store` if the read fails or an entry is malformed.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn get_wishlist_items(&self, user: &UserId) -> Result<Vec<FavoriteItem>, WishlistError> {
        let docs = self.store.list(&layout::favorites(user)?).await?;
        docs.iter()
            .map(|doc| FavoriteItem::from_document(doc).map_err(WishlistError::from))
            .collect()
    }

    /// Add the product if absent, remove it if present. Returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::Store` if the store fails.
    #[instrument(skip(self, product), fields(user = %user, product = %product.id))]
    pub async fn toggle_favorite(
        &self,
        user: &UserId,
        product: &Product,
    ) -> Result<bool, WishlistError> {
        if self.is_favorite(user, &product.id).await? {
            self.remove_from_wishlist(user, &product.id).await?;
            return Ok(false);
        }
        match self.add_to_wishlist(user, product).await {
            Ok(_) | Err(WishlistError::AlreadyFavorite(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Put a wishlist entry in the cart with quantity one.
    ///
    /// The entry stays on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::NotFavorite` if the product is not on the wishlist.
    /// Returns `WishlistError::Cart` wrapping `CartError::AlreadyInCart` if the
    /// product is already in the cart.
    #[instrument(skip(self), fields(user = %user, product = %product_id))]
    pub async fn move_to_cart(
        &self,
        user: &UserId,
        product_id: &ProductId,
    ) -> Result<CartItem, WishlistError> {
        let path = layout::favorite_item(user, product_id)?;
        let doc = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| WishlistError::NotFavorite(product_id.clone()))?;
        let favorite = FavoriteItem::from_document(&doc)?;

        let item = CartItem {
            id: favorite.id,
            title: favorite.title,
            image: favorite.image,
            unit_price: favorite.price,
            category: favorite.category,
            quantity: 1,
        };
        Ok(self.cart.add_item(user, item).await?)
    }

    /// Live wishlist contents: the current entries, then all entries after every change.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::Path` if the user id cannot form a wishlist path.
    pub fn watch_wishlist(
        &self,
        user: &UserId,
    ) -> Result<
        impl Stream<Item = Result<Vec<FavoriteItem>, WishlistError>> + Send + use<>,
        WishlistError,
    > {
        let collection = layout::favorites(user)?;
        Ok(
            store::snapshots(Arc::clone(&self.store), collection).map(
                |snapshot| -> Result<Vec<FavoriteItem>, WishlistError> {
                    Ok(snapshot?
                        .iter()
                        .map(FavoriteItem::from_document)
                        .collect::<Result<Vec<_>, _>>()?)
                },
            ),
        )
    }

    /// Move every legacy favorite of `user` into the current layout.
    ///
    /// Entries already present in the current layout are kept as they are.
    /// Legacy documents are deleted once copied; unreadable ones are left.
    ///
    /// # Errors
    ///
    /// Returns `WishlistError::Store` if the store fails.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn migrate_legacy_favorites(
        &self,
        user: &UserId,
    ) -> Result<MigrationReport, WishlistError> {
        let legacy = self.store.list(&layout::legacy_favorites(user)?).await?;
        let mut report = MigrationReport::default();

        for doc in legacy {
            let item = match FavoriteItem::from_document(&doc) {
                Ok(item) => item,
                Err(e) => {
                    warn!(path = %doc.path, error = %e, "Skipping unreadable legacy favorite");
                    report.failed += 1;
                    continue;
                }
            };

            let path = layout::favorite_item(user, &item.id)?;
            match self.store.create(&path, item.to_document()?).await {
                Ok(()) => report.migrated += 1,
                Err(StoreError::AlreadyExists(_)) => report.skipped += 1,
                Err(e) => return Err(e.into()),
            }
            self.store.delete(&doc.path).await?;
            debug!(product = %item.id, "Migrated legacy favorite");
        }

        info!(
            migrated = report.migrated,
            skipped = report.skipped,
            failed = report.failed,
            "Legacy favorites migrated"
        );
        Ok(report)
    }
}
