//! Session-related types.
//!
//! Types stored in the session to identify the shopper.

use serde::{Deserialize, Serialize};

use souq_core::UserId;

/// Session-stored shopper identity.
///
/// Every visitor gets one: a minted guest id on first request, or an
/// explicit id bound through `POST /session/identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentShopper {
    /// Key of the shopper's `users/{userId}` document tree.
    pub id: UserId,
}

impl CurrentShopper {
    /// A fresh anonymous shopper.
    #[must_use]
    pub fn guest() -> Self {
        Self { id: UserId::guest() }
    }

    /// Whether the shopper is still anonymous.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.id.is_guest()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current shopper.
    pub const CURRENT_SHOPPER: &str = "current_shopper";
}
