//! Seed the catalog from a file.
//!
//! The file is a JSON or YAML list of product objects. Each object needs an
//! `id`, which becomes the document key; every other field is stored as-is.
//! Existing products with the same id are overwritten.
//!
//! ```yaml
//! - id: p1
//!   title: Striped Pullover
//!   price: { amount: 1500, currencyCode: EGP }
//!   brand: [Acme]
//!   sizes: ["4Y", "6Y"]
//!   in_stock: true
//! ```

use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use souq_core::{CollectionPath, ProductId};
use souq_storefront::store::{DocumentStore, PgDocumentStore};

/// Errors found while reading a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("seed file must contain a list of products")]
    NotAList,
    #[error("entry {0} is not an object")]
    NotAnObject(usize),
    #[error("entry {0} has no usable id: {1}")]
    BadId(usize, String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A product document ready to write.
#[derive(Debug)]
pub struct SeedProduct {
    pub id: ProductId,
    pub data: Value,
}

/// Seed catalog products from a file.
///
/// # Arguments
///
/// * `file_path` - Path to a `.json`, `.yaml` or `.yml` file
/// * `collection` - Target collection, or the configured catalog collection
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the database
/// cannot be reached.
pub async fn catalog(
    file_path: &str,
    collection: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    let products = parse_products(&content, is_yaml)?;
    info!(products = products.len(), "Parsed seed file");

    let (config, pool) = super::connect().await?;
    let collection = match collection {
        Some(raw) => CollectionPath::parse(raw)?,
        None => config.catalog_collection,
    };

    let store = PgDocumentStore::new(pool);
    for product in products {
        let doc_path = collection.doc(product.id.as_str())?;
        store.set(&doc_path, product.data).await?;
    }

    info!(collection = %collection, "Catalog seeded");
    Ok(())
}

/// Parse a seed file into product documents.
///
/// # Errors
///
/// Returns `SeedError` if the content is not a list of objects with ids.
pub fn parse_products(content: &str, is_yaml: bool) -> Result<Vec<SeedProduct>, SeedError> {
    let value: Value = if is_yaml {
        serde_yaml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };
    let Value::Array(entries) = value else {
        return Err(SeedError::NotAList);
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let Value::Object(mut data) = entry else {
                return Err(SeedError::NotAnObject(index));
            };
            let id = match data.remove("id") {
                Some(Value::String(s)) => s,
                Some(Value::Number(n)) => n.to_string(),
                _ => return Err(SeedError::BadId(index, "missing".to_string())),
            };
            let id = ProductId::parse(&id).map_err(|e| SeedError::BadId(index, e.to_string()))?;
            Ok(SeedProduct {
                id,
                data: Value::Object(data),
            })
        })
        .collect()
}
