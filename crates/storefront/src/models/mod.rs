//! Domain models for storefront.
//!
//! Every model decodes leniently from raw store documents, since documents
//! written by older clients omit fields or use looser types.

pub mod cart;
pub mod favorite;
pub mod product;
pub mod session;

pub use cart::CartItem;
pub use favorite::FavoriteItem;
pub use product::Product;
pub use session::{CurrentShopper, keys as session_keys};
