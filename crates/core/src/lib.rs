//! Souq Core - Shared types library.
//!
//! This crate provides common types used across all Souq components:
//! - `storefront` - Public-facing storefront API (products, wishlist, cart, checkout)
//! - `cli` - Command-line tools for migrations, seeding and data fixes
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Document keys, store paths, prices and checkout enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
