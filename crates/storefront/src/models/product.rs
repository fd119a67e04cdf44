//! Catalog products and lenient decoding of catalog documents.
//!
//! Catalog documents are written by hand and by older tooling, so fields are
//! frequently missing or loosely typed (numbers as strings, a single brand
//! instead of a list, sizes wrapped in quotes). [`Product::from_document`]
//! fills every gap with a default instead of rejecting the document.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use souq_core::{CurrencyCode, IdError, Price, ProductId};

use crate::store::Document;

/// Brand used when a catalog document has none.
pub const UNKNOWN_BRAND: &str = "Unknown Brand";
/// Title used when a catalog document has none.
pub const UNTITLED_PRODUCT: &str = "Untitled Product";
/// Category used when a document has none.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// A catalog product. Read-only; the storefront never writes the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Image URL (empty when the document has none).
    pub image: String,
    pub price: Price,
    pub category: String,
    #[serde(rename = "brand")]
    pub brands: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub in_stock: bool,
    pub quantity: u32,
}

impl Product {
    /// Whether the product can be ordered: flagged in stock or has quantity left.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.in_stock || self.quantity > 0
    }

    /// Normalize a raw catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error only if the document key is not a valid product id.
    pub fn from_document(doc: &Document) -> Result<Self, IdError> {
        let data = &doc.data;
        let id = ProductId::parse(doc.id())?;

        let brands = match data.get("brand") {
            Some(Value::Array(items)) => string_list(items),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
            _ => vec![UNKNOWN_BRAND.to_owned()],
        };

        let sizes = data
            .get("sizes")
            .and_then(Value::as_array)
            .map(|items| {
                string_list(items)
                    .into_iter()
                    .map(|s| strip_quotes(&s))
                    .collect()
            })
            .unwrap_or_default();

        let colors = data
            .get("colors")
            .and_then(Value::as_array)
            .map(|items| string_list(items))
            .unwrap_or_default();

        let quantity = data
            .get("quantity")
            .and_then(Value::as_f64)
            .map_or(0, stock_count);

        Ok(Self {
            id,
            title: non_empty_str(data.get("title")).unwrap_or(UNTITLED_PRODUCT).to_owned(),
            image: image_url(data.get("image")),
            price: data
                .get("price")
                .and_then(price_from_value)
                .unwrap_or_else(|| Price::zero(CurrencyCode::default())),
            category: non_empty_str(data.get("category"))
                .unwrap_or(UNKNOWN_CATEGORY)
                .to_owned(),
            brands,
            sizes,
            colors,
            in_stock: data.get("in_stock").and_then(Value::as_bool).unwrap_or(false),
            quantity,
        })
    }
}

/// Parse a decimal from a JSON number or numeric string.
pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

/// Parse a price from `{amount, currencyCode}`, a bare number, or a numeric string.
///
/// A missing amount is zero and a missing or unknown currency is the default.
pub(crate) fn price_from_value(value: &Value) -> Option<Price> {
    match value {
        Value::Object(map) => {
            let amount = map
                .get("amount")
                .and_then(decimal_from_value)
                .unwrap_or(Decimal::ZERO);
            let currency = map
                .get("currencyCode")
                .and_then(Value::as_str)
                .and_then(|code| code.parse::<CurrencyCode>().ok())
                .unwrap_or_default();
            Some(Price::new(amount, currency))
        }
        Value::Number(_) | Value::String(_) => {
            decimal_from_value(value).map(|amount| Price::new(amount, CurrencyCode::default()))
        }
        _ => None,
    }
}

/// Image URL from either a plain string or an `{src}` object.
pub(crate) fn image_url(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => map
            .get("src")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        _ => String::new(),
    }
}

/// A string field that is present and not blank.
pub(crate) fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Whole units in stock; negative or non-finite counts are zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn stock_count(raw: f64) -> u32 {
    if raw.is_finite() && raw > 0.0 {
        raw.floor().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

fn string_list(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}

fn strip_quotes(s: &str) -> String {
    s.replace(['\'', '"'], "")
}
