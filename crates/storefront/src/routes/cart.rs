//! Cart route handlers.
//!
//! Lines are keyed by product id. The product itself is looked up in the
//! catalog, so clients only send ids and quantities.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use souq_core::ProductId;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::Shopper;
use crate::models::CartItem;
use crate::services::{CartSummary, QuantityUpdate, parse_quantity};
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartForm {
    pub product_id: ProductId,
    /// Defaults to one. Numeric strings are accepted.
    #[serde(default)]
    pub quantity: Option<Value>,
}

/// Update cart line form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: Value,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// What a quantity update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Updated,
    Ignored,
    Missing,
}

/// Answer to a quantity update.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub status: UpdateStatus,
    pub cart: CartSummary,
}

/// Cart badge count.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Show the cart.
///
/// GET /cart
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Shopper(user): Shopper,
) -> Result<Json<CartSummary>> {
    Ok(Json(state.cart().cart_summary(&user).await?))
}

/// Stream the cart as it changes.
///
/// GET /cart/events
#[instrument(skip(state))]
pub async fn live(
    State(state): State<AppState>,
    Shopper(user): Shopper,
) -> Result<impl IntoResponse> {
    let snapshots = state.cart().watch_cart(&user)?;
    Ok(super::live_events("cart", snapshots))
}

/// Add item to cart.
///
/// POST /cart/add
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Json(form): Json<AddToCartForm>,
) -> Result<(StatusCode, Json<CartItem>)> {
    let quantity = match &form.quantity {
        None | Some(Value::Null) => 1,
        Some(raw) => parse_quantity(raw)
            .ok_or_else(|| AppError::BadRequest("quantity must be a number".to_string()))?,
    };

    let product = state.catalog().find(&form.product_id).await?;
    let item = state.cart().add_to_cart(&user, &product, quantity).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", form.product_id.as_str())]),
    );
    Ok((StatusCode::CREATED, Json(item)))
}

/// Update cart line quantity.
///
/// POST /cart/update
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Json(form): Json<UpdateCartForm>,
) -> Result<Json<UpdateResponse>> {
    let quantity = parse_quantity(&form.quantity);
    let status = match state
        .cart()
        .update_cart_quantity(&user, &form.product_id, quantity)
        .await?
    {
        QuantityUpdate::Updated(_) => UpdateStatus::Updated,
        QuantityUpdate::Ignored => UpdateStatus::Ignored,
        QuantityUpdate::Missing => UpdateStatus::Missing,
    };

    let cart = state.cart().cart_summary(&user).await?;
    Ok(Json(UpdateResponse { status, cart }))
}

/// Remove item from cart.
///
/// POST /cart/remove
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Json(form): Json<RemoveFromCartForm>,
) -> Result<Json<CartSummary>> {
    state.cart().remove_from_cart(&user, &form.product_id).await?;
    add_breadcrumb(
        "cart",
        "Removed from cart",
        Some(&[("product_id", form.product_id.as_str())]),
    );
    Ok(Json(state.cart().cart_summary(&user).await?))
}

/// Get cart item count (for badge updates).
///
/// GET /cart/count
#[instrument(skip(state))]
pub async fn count(
    State(state): State<AppState>,
    Shopper(user): Shopper,
) -> Result<Json<CartCount>> {
    let summary = state.cart().cart_summary(&user).await?;
    Ok(Json(CartCount {
        count: summary.item_count,
    }))
}
