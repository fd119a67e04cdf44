//! Shopper identity extractor.
//!
//! Every request is served on behalf of a shopper. The identity lives in the
//! session; a visitor without one is given a guest id on first use.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::Span;

use souq_core::UserId;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentShopper, session_keys};

/// Extractor resolving the current shopper's id.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Shopper(user): Shopper) -> impl IntoResponse {
///     format!("Hello, {user}!")
/// }
/// ```
#[derive(Debug)]
pub struct Shopper(pub UserId);

impl<S> FromRequestParts<S> for Shopper
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let stored = session
            .get::<CurrentShopper>(session_keys::CURRENT_SHOPPER)
            .await
            .map_err(|e| AppError::Internal(format!("session read failed: {e}")))?;

        let shopper = match stored {
            Some(shopper) => shopper,
            None => {
                let shopper = CurrentShopper::guest();
                set_current_shopper(session, &shopper)
                    .await
                    .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;
                tracing::debug!(user = %shopper.id, "Minted guest shopper");
                shopper
            }
        };

        Span::current().record("user_id", shopper.id.as_str());
        set_sentry_user(&shopper.id);

        Ok(Self(shopper.id))
    }
}

/// Helper to set the current shopper in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_shopper(
    session: &Session,
    shopper: &CurrentShopper,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_SHOPPER, shopper).await
}
