//! First-run setup.
//!
//! Only available while no initialization marker exists. Creates the root
//! administrator's auth account, runs the bootstrap batch and signs the new
//! administrator in.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use libris_core::{Email, Phase};

use super::session_error;
use crate::db::{AdminAccountRepository, AdminProfile};
use crate::error::{AppError, set_sentry_user};
use crate::lifecycle::{Initializer, LifecycleError, StateProber};
use crate::middleware::set_current_admin;
use crate::models::CurrentAdmin;
use crate::services::auth::sign_up_or_sign_in;
use crate::services::auth::local::MIN_PASSWORD_LENGTH;
use crate::state::AppState;

/// Build the setup router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/setup/initialize", post(initialize))
}

/// Root administrator details.
#[derive(Deserialize, Validate)]
pub struct InitializeRequest {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = MIN_PASSWORD_LENGTH, message = "Password is too short"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub admin: CurrentAdmin,
    #[serde(flatten)]
    pub phase: Phase,
}

/// Bootstrap the store with the caller as root administrator.
#[instrument(skip_all)]
async fn initialize(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<InitializeRequest>,
) -> Result<(StatusCode, Json<InitializeResponse>), AppError> {
    payload.validate()?;
    let email = Email::parse(&payload.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let password = SecretString::from(payload.password);

    let initializer = Initializer::new(state.store());
    if initializer.is_initialized().await? {
        return Err(LifecycleError::AlreadyInitialized.into());
    }

    // A previous attempt may have created the auth account before the batch
    // failed.
    let auth_session = sign_up_or_sign_in(state.auth(), &email, &password, &payload.name).await?;

    let profile = AdminProfile {
        name: payload.name,
        email: email.clone(),
        uid: Some(auth_session.uid),
    };
    initializer.initialize(&profile).await?;

    let account = AdminAccountRepository::new(state.store())
        .record_login(&email)
        .await?
        .ok_or_else(|| AppError::Internal("root administrator missing after setup".to_string()))?;

    let admin = CurrentAdmin::from(&account);
    set_current_admin(&session, &admin)
        .await
        .map_err(session_error)?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));

    let phase = StateProber::new(state.store()).probe_signed_in(true).await;
    Ok((StatusCode::CREATED, Json(InitializeResponse { admin, phase })))
}
