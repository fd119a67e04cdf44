//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Cached, normalized catalog listings
//! - `facets` - Product listing filters
//! - `cart` - Per-shopper cart lines
//! - `wishlist` - Per-shopper favorites, including the legacy layout migration
//! - `checkout` - Form validation and order submission
//! - `identity` - Signed shopper ids for session binding
//!
//! Every operation takes the shopper's `UserId` explicitly; services hold no
//! per-shopper state.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod facets;
pub mod identity;
pub mod wishlist;

pub use cart::{CartError, CartService, CartSummary, QuantityUpdate, parse_quantity};
pub use catalog::{CatalogError, CatalogService};
pub use checkout::{
    CheckoutError, CheckoutForm, CheckoutService, FieldErrors, OrderConfirmation,
    format_card_number,
};
pub use facets::{FacetFilter, filter_products};
pub use identity::{IdentityError, IdentityVerifier};
pub use wishlist::{MigrationReport, WishlistError, WishlistService};
