//! Canonical paths for per-user collections.

use souq_core::{CollectionPath, DocumentPath, PathError, ProductId, UserId};

/// Top-level users collection.
pub const USERS: &str = "users";
/// Per-user cart subcollection.
pub const CART: &str = "cart";
/// Per-user wishlist subcollection.
pub const FAVORITES: &str = "favorites";
/// Subcollection name used by the legacy `favorites/{userId}/items` layout.
pub const LEGACY_ITEMS: &str = "items";

fn user_collection(user: &UserId, name: &str) -> Result<CollectionPath, PathError> {
    CollectionPath::root(USERS)?
        .doc(user.as_str())?
        .collection(name)
}

/// `users/{userId}/cart`
///
/// # Errors
///
/// Returns an error if the user id is not a valid path segment.
pub fn cart(user: &UserId) -> Result<CollectionPath, PathError> {
    user_collection(user, CART)
}

/// `users/{userId}/cart/{productId}`
///
/// # Errors
///
/// Returns an error if either id is not a valid path segment.
pub fn cart_item(user: &UserId, product: &ProductId) -> Result<DocumentPath, PathError> {
    cart(user)?.doc(product.as_str())
}

/// `users/{userId}/favorites`
///
/// # Errors
///
/// Returns an error if the user id is not a valid path segment.
pub fn favorites(user: &UserId) -> Result<CollectionPath, PathError> {
    user_collection(user, FAVORITES)
}

/// `users/{userId}/favorites/{productId}`
///
/// # Errors
///
/// Returns an error if either id is not a valid path segment.
pub fn favorite_item(user: &UserId, product: &ProductId) -> Result<DocumentPath, PathError> {
    favorites(user)?.doc(product.as_str())
}

/// `favorites/{userId}/items`, the legacy wishlist layout.
///
/// # Errors
///
/// Returns an error if the user id is not a valid path segment.
pub fn legacy_favorites(user: &UserId) -> Result<CollectionPath, PathError> {
    CollectionPath::root(FAVORITES)?
        .doc(user.as_str())?
        .collection(LEGACY_ITEMS)
}
