//! Facet filtering for product listings.
//!
//! A [`FacetFilter`] holds up to five independent facets. A product is kept
//! when it passes every facet that is present (AND); within the brand, size
//! and color facets, matching any selected value is enough (OR). A missing
//! facet, or one with nothing selected, places no constraint.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::Product;
use crate::models::product::decimal_from_value;

/// Stock facet. Both flags set excludes everything, matching the UI's two
/// independent checkboxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityFacet {
    /// Keep only products that are in stock.
    #[serde(default)]
    pub in_stock: bool,
    /// Keep only products that are out of stock.
    #[serde(default)]
    pub out_of_stock: bool,
}

/// Inclusive price range. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFacet {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub min: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub max: Option<Decimal>,
}

/// Selected values of a multi-select facet (`{"acme": true, "nike": false}`).
pub type ValueFacet = BTreeMap<String, bool>;

/// A product listing filter.
///
/// Deserializes from the listing UI's filter object, e.g.
/// `{"price": {"min": 1000, "max": 2000}, "brand": {"acme": true}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<ValueFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ValueFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ValueFacet>,
}

impl FacetFilter {
    /// Whether no facet is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.availability.is_none()
            && self.price.is_none()
            && self.brand.is_none()
            && self.size.is_none()
            && self.color.is_none()
    }

    /// Whether a single product passes every present facet.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(availability) = &self.availability {
            let in_stock = product.is_available();
            if availability.in_stock && !in_stock {
                return false;
            }
            if availability.out_of_stock && in_stock {
                return false;
            }
        }

        if let Some(price) = &self.price {
            let amount = product.price.amount;
            if amount < price.min.unwrap_or(Decimal::ZERO) {
                return false;
            }
            // A zero maximum is an unset slider, not a ceiling
            if price.max.is_some_and(|max| !max.is_zero() && amount > max) {
                return false;
            }
        }

        matches_any(self.brand.as_ref(), &product.brands)
            && matches_any(self.size.as_ref(), &product.sizes)
            && matches_any(self.color.as_ref(), &product.colors)
    }
}

/// Apply a filter to a product list, preserving order.
#[must_use]
pub fn filter_products(products: &[Product], filter: &FacetFilter) -> Vec<Product> {
    if filter.is_empty() {
        return products.to_vec();
    }
    products
        .iter()
        .filter(|product| filter.matches(product))
        .cloned()
        .collect()
}

/// Canonical form for comparing facet values: trimmed, lowercase, no quotes.
#[must_use]
pub fn normalize_facet_value(value: &str) -> String {
    value.trim().to_lowercase().replace(['\'', '"'], "")
}

fn matches_any(facet: Option<&ValueFacet>, values: &[String]) -> bool {
    let Some(facet) = facet else {
        return true;
    };
    let active: Vec<String> = facet
        .iter()
        .filter(|(_, selected)| **selected)
        .map(|(value, _)| normalize_facet_value(value))
        .collect();
    if active.is_empty() {
        return true;
    }
    values
        .iter()
        .map(|value| normalize_facet_value(value))
        .any(|value| active.contains(&value))
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => decimal_from_value(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {value}"))),
    }
}
