//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use souq_core::ProductId;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::Shopper;
use crate::models::{CartItem, FavoriteItem};
use crate::state::AppState;

/// Wishlist request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistForm {
    pub product_id: ProductId,
}

/// Favorites with their count.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<FavoriteItem>,
    pub count: usize,
}

/// Whether a product is a favorite.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub product_id: ProductId,
    pub is_favorite: bool,
}

/// Show the wishlist.
///
/// GET /wishlist
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Shopper(user): Shopper,
) -> Result<Json<WishlistView>> {
    let items = state.wishlist().get_wishlist_items(&user).await?;
    Ok(Json(WishlistView {
        count: items.len(),
        items,
    }))
}

/// Stream the wishlist as it changes.
///
/// GET /wishlist/events
#[instrument(skip(state))]
pub async fn live(
    State(state): State<AppState>,
    Shopper(user): Shopper,
) -> Result<impl IntoResponse> {
    let snapshots = state.wishlist().watch_wishlist(&user)?;
    Ok(super::live_events("wishlist", snapshots))
}

/// Whether a product is on the wishlist.
///
/// GET /wishlist/{product_id}/status
#[instrument(skip(state))]
pub async fn status(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Path(product_id): Path<String>,
) -> Result<Json<FavoriteStatus>> {
    let product_id = ProductId::parse(&product_id)
        .map_err(|e| AppError::BadRequest(format!("invalid product id: {e}")))?;
    let is_favorite = state.wishlist().is_favorite(&user, &product_id).await?;
    Ok(Json(FavoriteStatus {
        product_id,
        is_favorite,
    }))
}

/// Add a product to the wishlist.
///
/// POST /wishlist/add
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Json(form): Json<WishlistForm>,
) -> Result<(StatusCode, Json<FavoriteItem>)> {
    let product = state.catalog().find(&form.product_id).await?;
    let item = state.wishlist().add_to_wishlist(&user, &product).await?;
    add_breadcrumb(
        "wishlist",
        "Added to wishlist",
        Some(&[("product_id", form.product_id.as_str())]),
    );
    Ok((StatusCode::CREATED, Json(item)))
}

/// Remove a product from the wishlist.
///
/// POST /wishlist/remove
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Json(form): Json<WishlistForm>,
) -> Result<StatusCode> {
    state
        .wishlist()
        .remove_from_wishlist(&user, &form.product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add the product if absent, remove it if present.
///
/// POST /wishlist/toggle
#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Json(form): Json<WishlistForm>,
) -> Result<Json<FavoriteStatus>> {
    let product = state.catalog().find(&form.product_id).await?;
    let is_favorite = state.wishlist().toggle_favorite(&user, &product).await?;
    Ok(Json(FavoriteStatus {
        product_id: form.product_id,
        is_favorite,
    }))
}

/// Put a favorite in the cart with quantity one.
///
/// POST /wishlist/move-to-cart
#[instrument(skip(state))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Json(form): Json<WishlistForm>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let item = state.wishlist().move_to_cart(&user, &form.product_id).await?;
    add_breadcrumb(
        "wishlist",
        "Moved to cart",
        Some(&[("product_id", form.product_id.as_str())]),
    );
    Ok((StatusCode::CREATED, Json(item)))
}
