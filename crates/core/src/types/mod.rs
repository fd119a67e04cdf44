//! Core types for Souq.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod path;
pub mod price;
pub mod status;

pub use id::*;
pub use path::{CollectionPath, DocumentPath, PathError};
pub use price::{CurrencyCode, Price};
pub use status::*;
