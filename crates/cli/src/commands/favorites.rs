//! Favorites maintenance commands.

use std::sync::Arc;

use tracing::info;

use souq_core::UserId;
use souq_storefront::services::{CartService, WishlistService};
use souq_storefront::store::{DocumentStore, PgDocumentStore};

/// Move a shopper's legacy favorites into the current layout.
///
/// # Errors
///
/// Returns an error if the user id is invalid, the database cannot be
/// reached or the store fails mid-migration.
pub async fn migrate_legacy(user_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let user = UserId::parse(user_id)?;
    let (_, pool) = super::connect().await?;

    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(pool));
    let wishlist = WishlistService::new(Arc::clone(&store), CartService::new(store));
    let report = wishlist.migrate_legacy_favorites(&user).await?;

    info!(
        user = %user,
        migrated = report.migrated,
        skipped = report.skipped,
        failed = report.failed,
        "Done"
    );
    Ok(())
}
