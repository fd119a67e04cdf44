//! Cart line items.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use souq_core::{CurrencyCode, Price, ProductId};

use super::product::{Product, UNKNOWN_CATEGORY, image_url, price_from_value};
use crate::store::{Document, StoreError};

/// One product in a shopper's cart, stored at `users/{userId}/cart/{productId}`.
///
/// Stores the unit price; the line total is always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub unit_price: Price,
    pub category: String,
    pub quantity: u32,
}

/// On-disk shape, tolerant of documents that store a line total in `price`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCartItem {
    id: Option<ProductId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    image: Option<Value>,
    #[serde(default)]
    unit_price: Option<Value>,
    /// Line total written by older clients.
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Build a cart line from a catalog product.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            image: product.image.clone(),
            unit_price: product.price,
            category: product.category.clone(),
            quantity,
        }
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }

    /// Decode a stored cart document.
    ///
    /// Documents without `unitPrice` carry a line total in `price`; the unit
    /// price is recovered once as `price / quantity`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the document is malformed.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let stored: StoredCartItem = doc.decode()?;
        let id = match stored.id {
            Some(id) => id,
            None => ProductId::parse(doc.id()).map_err(|e| {
                StoreError::Serialization(<serde_json::Error as serde::de::Error>::custom(e))
            })?,
        };

        let unit_price = stored
            .unit_price
            .as_ref()
            .and_then(price_from_value)
            .or_else(|| {
                let total = stored.price.as_ref().and_then(price_from_value)?;
                if stored.quantity == 0 {
                    return Some(total);
                }
                let unit = total.amount / rust_decimal::Decimal::from(stored.quantity);
                Some(Price::new(unit, total.currency_code))
            })
            .unwrap_or_else(|| Price::zero(CurrencyCode::default()));

        Ok(Self {
            id,
            title: stored.title,
            image: image_url(stored.image.as_ref()),
            unit_price,
            category: stored
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_CATEGORY.to_owned()),
            quantity: stored.quantity,
        })
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if encoding fails.
    pub fn to_document(&self) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use souq_core::DocumentPath;

    use super::*;

    fn doc(data: Value) -> Document {
        Document {
            path: DocumentPath::parse("users/u1/cart/p1").unwrap(),
            data,
        }
    }

    fn item(quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::parse("p1").unwrap(),
            title: "Pullover".to_owned(),
            image: String::new(),
            unit_price: Price::new(Decimal::new(3333, 2), CurrencyCode::EGP),
            category: "boys".to_owned(),
            quantity,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(item(3).line_total().amount, Decimal::new(9999, 2));
    }

    #[test]
    fn test_document_roundtrip_keeps_unit_price() {
        let original = item(2);
        let decoded = CartItem::from_document(&doc(original.to_document().unwrap())).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_legacy_total_price_document() {
        let decoded = CartItem::from_document(&doc(json!({
            "id": "p1",
            "title": "Pullover",
            "image": "https://cdn.example.com/p1.jpg",
            "price": 300,
            "category": "boys",
            "quantity": 3
        })))
        .unwrap();

        assert_eq!(decoded.unit_price.amount, Decimal::from(100));
        assert_eq!(decoded.line_total().amount, Decimal::from(300));
        assert_eq!(decoded.image, "https://cdn.example.com/p1.jpg");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let decoded = CartItem::from_document(&doc(json!({}))).unwrap();
        assert_eq!(decoded.id.as_str(), "p1");
        assert_eq!(decoded.quantity, 1);
        assert_eq!(decoded.category, UNKNOWN_CATEGORY);
        assert_eq!(decoded.unit_price, Price::zero(CurrencyCode::USD));
    }
}
