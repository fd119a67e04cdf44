//! Wishlist entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use souq_core::{CurrencyCode, Price, ProductId};

use super::product::{Product, UNKNOWN_CATEGORY, image_url, non_empty_str, price_from_value};
use crate::store::{Document, StoreError};

/// One product on a shopper's wishlist, stored at
/// `users/{userId}/favorites/{productId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub price: Price,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl FavoriteItem {
    /// Build a wishlist entry from a catalog product, stamped with the current time.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            image: product.image.clone(),
            price: product.price,
            category: product.category.clone(),
            added_at: Some(Utc::now()),
        }
    }

    /// Decode a stored wishlist document, canonical or legacy.
    ///
    /// Legacy documents store `price` as a bare number and may lack `addedAt`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the document key is not a valid
    /// product id.
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let data = &doc.data;
        let id = match data.get("id").and_then(Value::as_str) {
            Some(raw) => ProductId::parse(raw),
            None => ProductId::parse(doc.id()),
        }
        .map_err(|e| StoreError::Serialization(<serde_json::Error as serde::de::Error>::custom(e)))?;

        Ok(Self {
            id,
            title: data
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            image: image_url(data.get("image")),
            price: data
                .get("price")
                .and_then(price_from_value)
                .unwrap_or_else(|| Price::zero(CurrencyCode::default())),
            category: non_empty_str(data.get("category"))
                .unwrap_or(UNKNOWN_CATEGORY)
                .to_owned(),
            added_at: data
                .get("addedAt")
                .and_then(Value::as_str)
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|at| at.with_timezone(&Utc)),
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
