//! Shopper identity handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use souq_core::UserId;

use crate::error::{AppError, Result, set_sentry_user};
use crate::middleware::{Shopper, set_current_shopper};
use crate::models::CurrentShopper;
use crate::services::IdentityError;
use crate::state::AppState;

/// Identity binding request.
///
/// `signature` is the token the identity provider issued for `user_id`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityForm {
    pub user_id: String,
    #[serde(default)]
    pub signature: Option<String>,
}

/// The session's shopper.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user_id: UserId,
    pub is_guest: bool,
}

impl From<UserId> for SessionView {
    fn from(user_id: UserId) -> Self {
        Self {
            is_guest: user_id.is_guest(),
            user_id,
        }
    }
}

/// Show the current shopper.
///
/// GET /session
#[instrument]
pub async fn show(Shopper(user): Shopper) -> Json<SessionView> {
    Json(user.into())
}

/// Bind the session to a shopper id issued by the identity provider.
///
/// The id must carry a valid signature. Carts and wishlists are keyed by
/// this id from the next request on.
///
/// POST /session/identity
#[instrument(skip(state, session, form), fields(user = %form.user_id))]
pub async fn identify(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<IdentityForm>,
) -> Result<Json<SessionView>> {
    let verifier = state.identity().ok_or(IdentityError::Disabled)?;
    let id = UserId::parse(&form.user_id)
        .map_err(|e| AppError::BadRequest(format!("invalid user id: {e}")))?;
    let signature = form
        .signature
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or(IdentityError::MissingSignature)?;
    if let Err(e) = verifier.verify(&id, signature) {
        tracing::warn!(user = %id, "Rejected identity signature");
        return Err(e.into());
    }

    // Prevent session fixation when the identity changes
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session cycle failed: {e}")))?;
    set_current_shopper(&session, &CurrentShopper { id: id.clone() })
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;

    tracing::Span::current().record("user_id", id.as_str());
    set_sentry_user(&id);
    tracing::info!(user = %id, "Session identity bound");

    Ok(Json(id.into()))
}
