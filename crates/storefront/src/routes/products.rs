//! Product listing handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::Product;
use crate::models::product::decimal_from_value;
use crate::services::FacetFilter;
use crate::services::facets::{AvailabilityFacet, PriceFacet, ValueFacet};
use crate::state::AppState;

/// Listing query string.
///
/// Multi-valued facets are comma separated:
/// `?availability=in_stock&min_price=1000&brand=acme,nike`.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub availability: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl ListingQuery {
    /// Build the equivalent facet filter.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for unknown availability values or
    /// non-numeric prices.
    pub fn to_filter(&self) -> Result<FacetFilter> {
        let availability = match self.availability.as_deref() {
            None => None,
            Some(raw) => {
                let mut facet = AvailabilityFacet::default();
                for value in split_list(raw) {
                    match value {
                        "in_stock" => facet.in_stock = true,
                        "out_of_stock" => facet.out_of_stock = true,
                        other => {
                            return Err(AppError::BadRequest(format!(
                                "unknown availability: {other}"
                            )));
                        }
                    }
                }
                Some(facet)
            }
        };

        let min = parse_price("min_price", self.min_price.as_deref())?;
        let max = parse_price("max_price", self.max_price.as_deref())?;
        let price = (min.is_some() || max.is_some()).then_some(PriceFacet { min, max });

        Ok(FacetFilter {
            availability,
            price,
            brand: self.brand.as_deref().map(selected),
            size: self.size.as_deref().map(selected),
            color: self.color.as_deref().map(selected),
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn selected(raw: &str) -> ValueFacet {
    split_list(raw).map(|value| (value.to_string(), true)).collect()
}

fn parse_price(name: &str, raw: Option<&str>) -> Result<Option<Decimal>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => decimal_from_value(&serde_json::Value::String(value.to_string()))
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("{name} must be a number"))),
    }
}

/// Product listing response.
#[derive(Debug, Serialize)]
pub struct ProductList {
    pub collection: String,
    pub total: usize,
    pub products: Vec<Product>,
    /// Values present in the unfiltered listing, for building facet inputs.
    pub facets: FacetValues,
}

/// Distinct facet values of a listing.
#[derive(Debug, Default, Serialize)]
pub struct FacetValues {
    pub brand: Vec<String>,
    pub size: Vec<String>,
    pub color: Vec<String>,
}

impl FacetValues {
    fn collect(products: &[Product]) -> Self {
        fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
            let mut seen = BTreeMap::new();
            for value in values {
                seen.entry(value.trim().to_lowercase())
                    .or_insert_with(|| value.trim().to_string());
            }
            seen.into_values().collect()
        }

        Self {
            brand: distinct(products.iter().flat_map(|p| &p.brands)),
            size: distinct(products.iter().flat_map(|p| &p.sizes)),
            color: distinct(products.iter().flat_map(|p| &p.colors)),
        }
    }
}

async fn listing(state: &AppState, filter: &FacetFilter) -> Result<ProductList> {
    let catalog = state.catalog();
    let all = catalog.products().await?;
    let products = crate::services::filter_products(&all, filter);

    Ok(ProductList {
        collection: catalog.default_collection().to_string(),
        total: products.len(),
        products,
        facets: FacetValues::collect(&all),
    })
}

/// List products, filtered by the query string.
///
/// GET /products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ProductList>> {
    let filter = query.to_filter()?;
    Ok(Json(listing(&state, &filter).await?))
}

/// List products, filtered by a JSON facet filter.
///
/// POST /products/filter
#[instrument(skip(state))]
pub async fn filter(
    State(state): State<AppState>,
    Json(filter): Json<FacetFilter>,
) -> Result<Json<ProductList>> {
    Ok(Json(listing(&state, &filter).await?))
}
