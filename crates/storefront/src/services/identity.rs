//! Signed shopper identities.
//!
//! The identity provider vouches for a shopper id by signing it with a secret
//! shared with the storefront: the token is the hex-encoded HMAC-SHA256 of the
//! id. Only ids whose token verifies can be bound to a session.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

use souq_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Why an identity could not be bound.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    /// No identity secret is configured.
    #[error("identity binding is disabled")]
    Disabled,

    #[error("identity signature is required")]
    MissingSignature,

    #[error("identity signature does not match")]
    InvalidSignature,

    /// The secret could not key the MAC.
    #[error("identity secret is unusable")]
    Key,
}

/// Signs and verifies shopper ids with the shared identity secret.
#[derive(Debug, Clone)]
pub struct IdentityVerifier {
    secret: SecretString,
}

impl IdentityVerifier {
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self, user: &UserId) -> Result<HmacSha256, IdentityError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| IdentityError::Key)?;
        mac.update(user.as_str().as_bytes());
        Ok(mac)
    }

    /// The token the identity provider hands out for `user`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Key` if the secret cannot key the MAC.
    pub fn sign(&self, user: &UserId) -> Result<String, IdentityError> {
        Ok(hex::encode(self.mac(user)?.finalize().into_bytes()))
    }

    /// Check a token for `user` in constant time.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidSignature` if the token is not valid hex
    /// or does not match.
    pub fn verify(&self, user: &UserId, signature: &str) -> Result<(), IdentityError> {
        let provided =
            hex::decode(signature.trim()).map_err(|_| IdentityError::InvalidSignature)?;
        self.mac(user)?
            .verify_slice(&provided)
            .map_err(|_| IdentityError::InvalidSignature)
    }
}
