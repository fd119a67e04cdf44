//! CLI command implementations.

pub mod favorites;
pub mod identity;
pub mod migrate;
pub mod seed;

use sqlx::PgPool;

use souq_storefront::config::{StorefrontConfig, require_database_url};
use souq_storefront::db;

/// Load configuration and connect to the storefront database.
async fn connect() -> Result<(StorefrontConfig, PgPool), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    let database_url = require_database_url(&config)?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;
    Ok((config, pool))
}
