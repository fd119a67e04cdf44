//! Checkout route handlers.
//!
//! Card, valU and cash-on-delivery orders are placed by `POST /checkout`.
//! PayPal orders are placed by the widget callbacks under `/checkout/paypal`.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::Shopper;
use crate::services::checkout::{CheckoutPage, WidgetAck, WidgetApproval, WidgetNotice};
use crate::services::{CheckoutForm, CheckoutService, OrderConfirmation, format_card_number};
use crate::state::AppState;

/// Card number to format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardNumberForm {
    pub card_number: String,
}

/// Card number grouped for display.
#[derive(Debug, Serialize)]
pub struct FormattedCard {
    pub formatted: String,
}

/// Show the checkout page data.
///
/// GET /checkout
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Shopper(user): Shopper,
) -> Result<Json<CheckoutPage>> {
    Ok(Json(state.checkout().page(&user).await?))
}

/// Validate the form and place the order.
///
/// POST /checkout
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<OrderConfirmation>)> {
    let confirmation = state.checkout().submit_order(&user, &form).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

/// Group card digits in fours.
///
/// POST /checkout/format-card
pub async fn format_card(Json(form): Json<CardNumberForm>) -> Json<FormattedCard> {
    Json(FormattedCard {
        formatted: format_card_number(&form.card_number),
    })
}

/// The payment widget approved and captured the payment.
///
/// POST /checkout/paypal/approve
#[instrument(skip(state, approval))]
pub async fn paypal_approve(
    State(state): State<AppState>,
    Shopper(user): Shopper,
    Json(approval): Json<WidgetApproval>,
) -> Result<(StatusCode, Json<OrderConfirmation>)> {
    let confirmation = state.checkout().widget_approved(&user, &approval).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

/// The payment widget failed.
///
/// POST /checkout/paypal/error
#[instrument(skip(body))]
pub async fn paypal_error(Shopper(user): Shopper, body: Bytes) -> Json<WidgetAck> {
    Json(CheckoutService::widget_failed(&user, &widget_notice(&body)))
}

/// The payer closed the payment widget.
///
/// POST /checkout/paypal/cancel
#[instrument(skip(body))]
pub async fn paypal_cancel(Shopper(user): Shopper, body: Bytes) -> Json<WidgetAck> {
    Json(CheckoutService::widget_cancelled(&user, &widget_notice(&body)))
}

/// Widgets post whatever they have, including nothing at all.
fn widget_notice(body: &[u8]) -> WidgetNotice {
    serde_json::from_slice(body).unwrap_or_default()
}
