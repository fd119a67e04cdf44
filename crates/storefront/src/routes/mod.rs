//! HTTP route handlers for storefront.
//!
//! All bodies are JSON. Every handler acts for the shopper resolved from the
//! session by [`crate::middleware::Shopper`].
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Health check
//! GET  /health/ready              - Readiness check (store reachable)
//!
//! # Session
//! GET  /session                   - Current shopper id
//! POST /session/identity          - Bind the session to a signed shopper id
//!
//! # Products
//! GET  /products                  - Listing, filtered by query string
//! POST /products/filter           - Listing, filtered by a JSON facet filter
//!
//! # Cart
//! GET  /cart                      - Cart lines with totals
//! GET  /cart/events               - Cart as server-sent events
//! GET  /cart/count                - Item count badge
//! POST /cart/add                  - Add a product
//! POST /cart/update               - Change a line quantity
//! POST /cart/remove               - Remove a line
//!
//! # Wishlist
//! GET  /wishlist                  - Favorites
//! GET  /wishlist/events           - Favorites as server-sent events
//! GET  /wishlist/{id}/status      - Whether a product is a favorite
//! POST /wishlist/add              - Add a product
//! POST /wishlist/remove           - Remove a product
//! POST /wishlist/toggle           - Add or remove a product
//! POST /wishlist/move-to-cart     - Copy a favorite into the cart
//!
//! # Checkout
//! GET  /checkout                  - Cart, form defaults and select options
//! POST /checkout                  - Validate and place the order
//! POST /checkout/format-card      - Group card digits for display
//! POST /checkout/paypal/approve   - Widget approved the payment
//! POST /checkout/paypal/error     - Widget failed
//! POST /checkout/paypal/cancel    - Payer closed the widget
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod products;
pub mod session;
pub mod wishlist;

use std::convert::Infallible;
use std::fmt::Display;

use axum::{
    Router,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
};
use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::state::AppState;

/// Create the session routes router.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(session::show))
        .route("/identity", post(session::identify))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/filter", post(products::filter))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/events", get(cart::live))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/events", get(wishlist::live))
        .route("/{product_id}/status", get(wishlist::status))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/toggle", post(wishlist::toggle))
        .route("/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::submit))
        .route("/format-card", post(checkout::format_card))
        .route("/paypal/approve", post(checkout::paypal_approve))
        .route("/paypal/error", post(checkout::paypal_error))
        .route("/paypal/cancel", post(checkout::paypal_cancel))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/session", session_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
}

/// Serve a snapshot stream as server-sent events.
///
/// Each snapshot becomes an event named `name` carrying its JSON. A failed
/// snapshot is logged and sent as an `error` event; the stream keeps going.
pub fn live_events<T, E, S>(
    name: &'static str,
    snapshots: S,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static>
where
    T: Serialize + 'static,
    E: Display + 'static,
    S: Stream<Item = Result<T, E>> + Send + 'static,
{
    let events = snapshots.map(move |snapshot| {
        let event = match snapshot.map(|value| serde_json::to_string(&value)) {
            Ok(Ok(json)) => Event::default().event(name).data(json),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to encode live snapshot");
                Event::default().event("error").data("encoding failed")
            }
            Err(e) => {
                tracing::warn!(error = %e, "Live snapshot failed");
                Event::default().event("error").data(e.to_string())
            }
        };
        Ok(event)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
