//! Newtype document keys for type-safe entity references.
//!
//! Documents in the store are keyed by strings (product ids, user ids), so
//! every id here wraps a `String`. Use the `define_id!` macro to create
//! wrappers that prevent accidentally mixing keys from different entities.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when parsing a document key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty (or only whitespace).
    #[error("id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a path separator.
    #[error("id cannot contain '/'")]
    ContainsSeparator,
}

/// Maximum length of a document key.
pub const MAX_ID_LENGTH: usize = 256;

/// Validate a raw document key.
///
/// # Errors
///
/// Returns an error if the key is empty, too long, or contains `/`.
pub fn validate_key(raw: &str) -> Result<&str, IdError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(IdError::Empty);
    }
    if key.len() > MAX_ID_LENGTH {
        return Err(IdError::TooLong { max: MAX_ID_LENGTH });
    }
    if key.contains('/') {
        return Err(IdError::ContainsSeparator);
    }
    Ok(key)
}

/// Macro to define a type-safe document key wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` as a plain string, validated through `parse()`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Validated construction via `parse()`, plus `as_str()` and `into_inner()`
/// - `Display`, `FromStr` and `AsRef<str>` implementations
///
/// # Example
///
/// ```rust
/// # use souq_core::define_id;
/// define_id!(ShopperId);
/// define_id!(SkuId);
///
/// let shopper = ShopperId::parse("u-1").unwrap();
/// let sku = SkuId::parse("u-1").unwrap();
/// assert_eq!(shopper.as_str(), sku.as_str());
///
/// // These are different types, so this won't compile:
/// // let _: ShopperId = sku;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse a key, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns an error if the key is empty, too long, or contains `/`.
            pub fn parse(raw: &str) -> ::core::result::Result<Self, $crate::IdError> {
                $crate::validate_key(raw).map(|key| Self(key.to_owned()))
            }

            /// Get the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::convert::TryFrom<String> for $name {
            type Error = $crate::IdError;

            fn try_from(raw: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(&raw)
            }
        }

        impl ::core::convert::From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity keys
define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);

impl UserId {
    /// Mint an anonymous shopper id for a visitor without an identity.
    #[must_use]
    pub fn guest() -> Self {
        Self(format!("guest-{}", Uuid::new_v4().simple()))
    }

    /// Whether this id was minted by [`UserId::guest`].
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0.starts_with("guest-")
    }
}

impl OrderId {
    /// Generate a fresh order reference (e.g. `ORD-1F2E3D4C`).
    #[must_use]
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string().to_uppercase();
        let short: String = simple.chars().take(8).collect();
        Self(format!("ORD-{short}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id = ProductId::parse("  sku-42 ").unwrap();
        assert_eq!(id.as_str(), "sku-42");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(ProductId::parse("   "), Err(IdError::Empty));
    }

    #[test]
    fn test_parse_rejects_separator() {
        assert_eq!(
            UserId::parse("users/evil"),
            Err(IdError::ContainsSeparator)
        );
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let long = "a".repeat(MAX_ID_LENGTH + 1);
        assert!(matches!(
            UserId::parse(&long),
            Err(IdError::TooLong { .. })
        ));
    }

    #[test]
    fn test_guest_ids_are_unique_and_marked() {
        let a = UserId::guest();
        let b = UserId::guest();
        assert_ne!(a, b);
        assert!(a.is_guest());
        assert!(!UserId::parse("alice").unwrap().is_guest());
    }

    #[test]
    fn test_order_id_format() {
        let id = OrderId::generate();
        assert!(id.as_str().starts_with("ORD-"));
        assert_eq!(id.as_str().len(), 12);
    }

    #[test]
    fn test_serde_as_plain_string() {
        let id = ProductId::parse("p1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");
    }

    #[test]
    fn test_deserialize_goes_through_parse() {
        let id: ProductId = serde_json::from_str("\" p1 \"").unwrap();
        assert_eq!(id.as_str(), "p1");

        assert!(serde_json::from_str::<ProductId>("\"\"").is_err());
        assert!(serde_json::from_str::<UserId>("\"users/evil\"").is_err());
        let long = format!("\"{}\"", "a".repeat(MAX_ID_LENGTH + 1));
        assert!(serde_json::from_str::<UserId>(&long).is_err());
    }
}
