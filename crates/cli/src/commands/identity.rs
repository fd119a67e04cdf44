//! Identity token commands.

use souq_core::UserId;
use souq_storefront::config::StorefrontConfig;
use souq_storefront::services::IdentityVerifier;

/// Print the token that lets a session bind to `user_id`.
///
/// Uses `STOREFRONT_IDENTITY_SECRET`, the same secret the storefront verifies with.
///
/// # Errors
///
/// Returns an error if the user id is invalid or no identity secret is set.
#[allow(clippy::print_stdout)]
pub fn sign(user_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let user = UserId::parse(user_id)?;
    let secret = StorefrontConfig::from_env()?
        .identity_secret
        .ok_or("STOREFRONT_IDENTITY_SECRET is not set")?;

    let token = IdentityVerifier::new(secret).sign(&user)?;
    println!("{token}");
    Ok(())
}
