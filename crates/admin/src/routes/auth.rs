//! Email/password sign-in routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use libris_core::Email;

use super::session_error;
use crate::db::AdminAccountRepository;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Verify credentials with the auth provider and open a session.
///
/// Credentials that the provider accepts but that have no administrator
/// document are rejected with 403.
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>, AppError> {
    payload.validate()?;
    let email = Email::parse(&payload.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let password = SecretString::from(payload.password);

    state.auth().sign_in(&email, &password).await?;

    let account = AdminAccountRepository::new(state.store())
        .record_login(&email)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Sign-in accepted for an account with no admin document");
            AppError::Forbidden("This account is not an administrator".to_string())
        })?;

    let admin = CurrentAdmin::from(&account);
    set_current_admin(&session, &admin)
        .await
        .map_err(session_error)?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));

    tracing::info!(role = %admin.role, "Admin signed in");
    Ok(Json(admin))
}

/// Handle logout.
async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_admin(&session)
        .await
        .map_err(session_error)?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in admin.
async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<CurrentAdmin> {
    Json(admin)
}
