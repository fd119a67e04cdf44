//! Shopping cart operations.
//!
//! A cart is the collection `users/{userId}/cart`, one document per product.
//! Adding is an atomic create, so a second add of the same product fails
//! instead of silently overwriting the first.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};

use souq_core::{CurrencyCode, PathError, Price, ProductId, UserId};

use crate::models::{CartItem, Product};
use crate::store::{self, DocumentStore, StoreError, layout};

/// Largest quantity a single cart line may hold.
pub const MAX_QUANTITY: u32 = 999;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity below one or above [`MAX_QUANTITY`].
    #[error("quantity must be between 1 and {MAX_QUANTITY}")]
    InvalidQuantity(i64),

    /// The product already has a line in the cart.
    #[error("already in cart")]
    AlreadyInCart(ProductId),

    /// A cart path could not be built from the ids.
    #[error("invalid cart path: {0}")]
    Path(#[from] PathError),

    /// Store access failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a quantity change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// The line now has the new quantity.
    Updated(CartItem),
    /// The requested quantity was missing, non-numeric or out of range.
    Ignored,
    /// The product has no line in the cart.
    Missing,
}

/// A cart with its derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub subtotal: Price,
    /// Sum of line quantities.
    pub item_count: u32,
}

impl CartSummary {
    /// Compute totals over a list of lines.
    ///
    /// The subtotal takes the currency of the first line. Totals saturate
    /// rather than overflow on stored lines that predate the quantity cap.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let currency = items
            .first()
            .map_or_else(CurrencyCode::default, |item| item.unit_price.currency_code);
        let amount = items
            .iter()
            .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.line_total().amount));
        let item_count = items
            .iter()
            .fold(0_u32, |acc, item| acc.saturating_add(item.quantity));

        Self {
            items,
            subtotal: Price::new(amount, currency),
            item_count,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart operations over a document store.
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn DocumentStore>,
}

impl CartService {
    /// Create a cart service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity` is below one or
    /// above [`MAX_QUANTITY`].
    /// Returns `CartError::AlreadyInCart` if the product is already in the cart.
    #[instrument(skip(self, product), fields(user = %user, product = %product.id))]
    pub async fn add_to_cart(
        &self,
        user: &UserId,
        product: &Product,
        quantity: i64,
    ) -> Result<CartItem, CartError> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| (1..=MAX_QUANTITY).contains(q))
            .ok_or(CartError::InvalidQuantity(quantity))?;
        self.add_item(user, CartItem::from_product(product, quantity))
            .await
    }

    /// Insert a prepared cart line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::AlreadyInCart` if the product is already in the cart.
    pub(crate) async fn add_item(&self, user: &UserId, item: CartItem) -> Result<CartItem, CartError> {
        let path = layout::cart_item(user, &item.id)?;
        match self.store.create(&path, item.to_document()?).await {
            Ok(()) => {
                debug!(quantity = item.quantity, "Added to cart");
                Ok(item)
            }
            Err(StoreError::AlreadyExists(_)) => Err(CartError::AlreadyInCart(item.id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a product from the cart. Removing a missing line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the delete fails.
    #[instrument(skip(self), fields(user = %user, product = %product_id))]
    pub async fn remove_from_cart(
        &self,
        user: &UserId,
        product_id: &ProductId,
    ) -> Result<(), CartError> {
        let path = layout::cart_item(user, product_id)?;
        self.store.delete(&path).await?;
        Ok(())
    }

    /// Set the quantity of a cart line.
    ///
    /// Quantities that are absent or outside `1..=MAX_QUANTITY` are ignored, as are lines that
    /// do not exist. The stored unit price is rewritten alongside the quantity
    /// so lines carrying only a line total are normalized on first update.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store fails.
    #[instrument(skip(self), fields(user = %user, product = %product_id))]
    pub async fn update_cart_quantity(
        &self,
        user: &UserId,
        product_id: &ProductId,
        new_quantity: Option<i64>,
    ) -> Result<QuantityUpdate, CartError> {
        let Some(quantity) = new_quantity
            .and_then(|q| u32::try_from(q).ok())
            .filter(|q| (1..=MAX_QUANTITY).contains(q))
        else {
            debug!(?new_quantity, "Ignoring quantity update");
            return Ok(QuantityUpdate::Ignored);
        };

        let path = layout::cart_item(user, product_id)?;
        let Some(doc) = self.store.get(&path).await? else {
            return Ok(QuantityUpdate::Missing);
        };
        let mut item = CartItem::from_document(&doc)?;
        item.quantity = quantity;

        let mut fields = Map::new();
        fields.insert("quantity".to_owned(), Value::from(quantity));
        fields.insert(
            "unitPrice".to_owned(),
            serde_json::to_value(item.unit_price).map_err(StoreError::from)?,
        );

        match self.store.update(&path, fields).await {
            Ok(()) => Ok(QuantityUpdate::Updated(item)),
            Err(StoreError::NotFound(_)) => Ok(QuantityUpdate::Missing),
            Err(e) => Err(e.into()),
        }
    }

    /// Read every line in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the read fails or a line is malformed.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn get_cart_items(&self, user: &UserId) -> Result<Vec<CartItem>, CartError> {
        let docs = self.store.list(&layout::cart(user)?).await?;
        docs.iter()
            .map(|doc| CartItem::from_document(doc).map_err(CartError::from))
            .collect()
    }

    /// Cart lines plus subtotal and item count.
    ///
    /// # Errors
    ///
    /// See [`CartService::get_cart_items`].
    pub async fn cart_summary(&self, user: &UserId) -> Result<CartSummary, CartError> {
        Ok(CartSummary::from_items(self.get_cart_items(user).await?))
    }

    /// Live cart contents: the current cart, then the full cart after every change.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Path` if the user id cannot form a cart path.
    pub fn watch_cart(
        &self,
        user: &UserId,
    ) -> Result<impl Stream<Item = Result<CartSummary, CartError>> + Send + use<>, CartError> {
        let collection = layout::cart(user)?;
        Ok(
            store::snapshots(Arc::clone(&self.store), collection).map(|snapshot| -> Result<CartSummary, CartError> {
                let items = snapshot?
                    .iter()
                    .map(CartItem::from_document)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CartSummary::from_items(items))
            }),
        )
    }
}

/// Parse a raw client quantity.
///
/// Accepts integers, numbers (truncated toward zero) and numeric strings.
/// Returns `None` for anything else.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_quantity(raw: &Value) -> Option<i64> {
    let truncate = |f: f64| f.is_finite().then(|| f.trunc() as i64);
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use souq_core::DocumentPath;

    use super::*;
    use crate::store::{Document, MemoryStore};

    fn user(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    fn product(id: &str, amount: Decimal) -> Product {
        Product::from_document(&Document {
            path: DocumentPath::parse(&format!("kids/closes/Boys Pullovers/{id}")).unwrap(),
            data: json!({
                "title": "Pullover",
                "price": { "amount": amount.to_string(), "currencyCode": "EGP" },
            }),
        })
        .unwrap()
    }

    fn service() -> (MemoryStore, CartService) {
        let store = MemoryStore::new();
        (store.clone(), CartService::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_add_twice_is_rejected() {
        let (_, cart) = service();
        let shopper = user("u1");
        let item = product("p1", Decimal::from(100));

        cart.add_to_cart(&shopper, &item, 1).await.unwrap();
        let second = cart.add_to_cart(&shopper, &item, 1).await;
        assert!(matches!(second, Err(CartError::AlreadyInCart(_))));

        assert_eq!(cart.get_cart_items(&shopper).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_quantity_below_one() {
        let (store, cart) = service();
        let item = product("p1", Decimal::from(100));

        for quantity in [0, -3, i64::from(MAX_QUANTITY) + 1] {
            let result = cart.add_to_cart(&user("u1"), &item, quantity).await;
            assert!(matches!(result, Err(CartError::InvalidQuantity(q)) if q == quantity));
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let (_, cart) = service();
        let item = product("p1", Decimal::from(100));

        cart.add_to_cart(&user("u1"), &item, 1).await.unwrap();
        cart.add_to_cart(&user("u2"), &item, 2).await.unwrap();

        assert_eq!(cart.get_cart_items(&user("u1")).await.unwrap()[0].quantity, 1);
        assert_eq!(cart.get_cart_items(&user("u2")).await.unwrap()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_update_ignores_invalid_quantities() {
        let (store, cart) = service();
        let shopper = user("u1");
        let id = ProductId::parse("p1").unwrap();
        cart.add_to_cart(&shopper, &product("p1", Decimal::from(100)), 2)
            .await
            .unwrap();
        let path = layout::cart_item(&shopper, &id).unwrap();
        let before = store.get(&path).await.unwrap();

        for raw in [json!(0), json!("abc"), json!(null), json!(-1), json!(1000)] {
            let update = cart
                .update_cart_quantity(&shopper, &id, parse_quantity(&raw))
                .await
                .unwrap();
            assert_eq!(update, QuantityUpdate::Ignored);
        }

        assert_eq!(store.get(&path).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_missing_line_is_noop() {
        let (store, cart) = service();
        let update = cart
            .update_cart_quantity(&user("u1"), &ProductId::parse("p1").unwrap(), Some(3))
            .await
            .unwrap();
        assert_eq!(update, QuantityUpdate::Missing);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_repeated_updates_keep_exact_total() {
        let (_, cart) = service();
        let shopper = user("u1");
        let id = ProductId::parse("p1").unwrap();
        cart.add_to_cart(&shopper, &product("p1", Decimal::new(3333, 2)), 1)
            .await
            .unwrap();

        for quantity in [3, 7, 2, 3] {
            cart.update_cart_quantity(&shopper, &id, Some(quantity))
                .await
                .unwrap();
        }

        let items = cart.get_cart_items(&shopper).await.unwrap();
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].line_total().amount, Decimal::new(9999, 2));
    }

    #[tokio::test]
    async fn test_update_normalizes_legacy_line_total() {
        let (store, cart) = service();
        let shopper = user("u1");
        let id = ProductId::parse("p1").unwrap();
        let path = layout::cart_item(&shopper, &id).unwrap();
        store
            .set(&path, json!({ "id": "p1", "title": "Old", "price": 300, "quantity": 3 }))
            .await
            .unwrap();

        cart.update_cart_quantity(&shopper, &id, Some(5)).await.unwrap();

        let items = cart.get_cart_items(&shopper).await.unwrap();
        assert_eq!(items[0].unit_price.amount, Decimal::from(100));
        assert_eq!(items[0].line_total().amount, Decimal::from(500));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (_, cart) = service();
        let shopper = user("u1");
        let id = ProductId::parse("p1").unwrap();
        cart.add_to_cart(&shopper, &product("p1", Decimal::from(100)), 1)
            .await
            .unwrap();

        cart.remove_from_cart(&shopper, &id).await.unwrap();
        cart.remove_from_cart(&shopper, &id).await.unwrap();
        assert!(cart.get_cart_items(&shopper).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cart_summary() {
        let (_, cart) = service();
        let shopper = user("u1");
        cart.add_to_cart(&shopper, &product("p1", Decimal::new(1050, 2)), 2)
            .await
            .unwrap();
        cart.add_to_cart(&shopper, &product("p2", Decimal::from(5)), 1)
            .await
            .unwrap();

        let summary = cart.cart_summary(&shopper).await.unwrap();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, Price::new(Decimal::from(26), CurrencyCode::EGP));
    }

    #[tokio::test]
    async fn test_huge_quantities_are_ignored() {
        let (_, cart) = service();
        let shopper = user("u1");
        for id in ["p1", "p2"] {
            cart.add_to_cart(&shopper, &product(id, Decimal::from(100)), 1)
                .await
                .unwrap();
            let update = cart
                .update_cart_quantity(
                    &shopper,
                    &ProductId::parse(id).unwrap(),
                    parse_quantity(&json!(4_294_967_295_u64)),
                )
                .await
                .unwrap();
            assert_eq!(update, QuantityUpdate::Ignored);
        }

        let summary = cart.cart_summary(&shopper).await.unwrap();
        assert_eq!(summary.item_count, 2);
    }

    #[tokio::test]
    async fn test_summary_saturates_on_stored_overflow() {
        let (store, cart) = service();
        let shopper = user("u1");
        for id in ["p1", "p2"] {
            let path = layout::cart_item(&shopper, &ProductId::parse(id).unwrap()).unwrap();
            store
                .set(
                    &path,
                    json!({
                        "id": id,
                        "title": "Bulk",
                        "unitPrice": { "amount": "79228162514264337593543950335", "currencyCode": "EGP" },
                        "quantity": u32::MAX,
                    }),
                )
                .await
                .unwrap();
        }

        let summary = cart.cart_summary(&shopper).await.unwrap();
        assert_eq!(summary.item_count, u32::MAX);
        assert_eq!(summary.subtotal.amount, Decimal::MAX);
    }

    #[test]
    fn test_empty_summary() {
        let summary = CartSummary::from_items(Vec::new());
        assert!(summary.is_empty());
        assert_eq!(summary.item_count, 0);
        assert_eq!(summary.subtotal, Price::zero(CurrencyCode::USD));
    }

    #[tokio::test]
    async fn test_watch_cart_is_scoped_to_user() {
        use std::time::Duration;

        let (store, cart) = service();
        let item = product("p1", Decimal::from(100));
        let mut stream = Box::pin(cart.watch_cart(&user("u1")).unwrap());

        assert!(stream.next().await.unwrap().unwrap().is_empty());

        cart.add_to_cart(&user("u2"), &item, 1).await.unwrap();
        let other_user = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
        assert!(other_user.is_err());

        cart.add_to_cart(&user("u1"), &item, 1).await.unwrap();
        let summary = stream.next().await.unwrap().unwrap();
        assert_eq!(summary.item_count, 1);

        drop(stream);
        assert_eq!(store.feed().subscriber_count(), 0);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!(3)), Some(3));
        assert_eq!(parse_quantity(&json!(2.9)), Some(2));
        assert_eq!(parse_quantity(&json!(" 4 ")), Some(4));
        assert_eq!(parse_quantity(&json!("1.5")), Some(1));
        assert_eq!(parse_quantity(&json!("abc")), None);
        assert_eq!(parse_quantity(&json!(true)), None);
        assert_eq!(parse_quantity(&json!(null)), None);
    }
}
