//! Admin user management routes.
//!
//! Any admin can list accounts; only a super admin can create them.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use libris_core::{AdminAccount, AdminRole, Email};

use crate::db::{AdminAccountRepository, AdminProfile};
use crate::error::AppError;
use crate::middleware::{RequireAdminAuth, RequireSuperAdmin};
use crate::services::auth::local::MIN_PASSWORD_LENGTH;
use crate::services::auth::sign_up_or_sign_in;
use crate::state::AppState;

/// Build the admin users router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/admins", get(list_admins).post(create_admin))
}

/// New administrator details.
#[derive(Deserialize, Validate)]
pub struct CreateAdminRequest {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = MIN_PASSWORD_LENGTH, message = "Password is too short"))]
    pub password: String,
    /// Defaults to `admin`.
    #[serde(default)]
    pub role: Option<AdminRole>,
}

/// All administrators, ordered by email.
async fn list_admins(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Result<Json<Vec<AdminAccount>>, AppError> {
    let admins = AdminAccountRepository::new(state.store()).list().await?;
    Ok(Json(admins))
}

/// Create the auth account, then the admin document.
///
/// An auth account left behind by an earlier failed attempt is reused when
/// the password matches. The caller's own session is left untouched.
#[instrument(skip_all, fields(created_by = %creator.email))]
async fn create_admin(
    State(state): State<AppState>,
    RequireSuperAdmin(creator): RequireSuperAdmin,
    Json(payload): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminAccount>), AppError> {
    payload.validate()?;
    let email = Email::parse(&payload.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let repository = AdminAccountRepository::new(state.store());
    if repository.get(&email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "an administrator with email {email} already exists"
        )));
    }

    let password = SecretString::from(payload.password);
    let auth_session = sign_up_or_sign_in(state.auth(), &email, &password, &payload.name).await?;

    let profile = AdminProfile {
        name: payload.name,
        email,
        uid: Some(auth_session.uid),
    };
    let account = repository
        .create(&profile, payload.role.unwrap_or(AdminRole::Admin))
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}
