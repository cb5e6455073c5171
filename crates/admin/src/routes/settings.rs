//! Organization and application settings routes.
//!
//! `PUT` bodies are partial documents with `PascalCase` keys. Each top-level
//! key replaces the stored key wholesale, so nested objects (`Contact`,
//! `Theme`, `OpeningHours`) must be sent complete.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
};
use serde_json::{Map, Value};
use tracing::instrument;

use libris_core::{ApplicationSettings, OrganizationSettings, OrganizationSettingsPatch};

use crate::db::SettingsStore;
use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::services::media::{MAX_UPLOAD_BYTES, UploadFile, upload_validated};
use crate::state::AppState;

/// Multipart framing allowance on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Form field carrying the logo.
const LOGO_FIELD: &str = "file";

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/settings/organization",
            get(get_organization).put(update_organization),
        )
        .route(
            "/api/settings/organization/logo",
            post(upload_logo).layer(DefaultBodyLimit::max(
                MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route(
            "/api/settings/application",
            get(get_application).put(update_application),
        )
}

/// Organization settings, or the defaults if none are stored.
async fn get_organization(
    State(state): State<AppState>,
) -> Result<Json<OrganizationSettings>, AppError> {
    let settings = SettingsStore::<OrganizationSettings>::new(state.store())
        .get()
        .await?;
    Ok(Json(settings))
}

/// Merge a partial update into the organization settings.
#[instrument(skip_all, fields(admin = %admin.email))]
async fn update_organization(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(partial): Json<Map<String, Value>>,
) -> Result<Json<OrganizationSettings>, AppError> {
    let settings = SettingsStore::<OrganizationSettings>::new(state.store())
        .update_validated(partial)
        .await?;
    Ok(Json(settings))
}

/// Upload a logo and store its URL in the organization settings.
#[instrument(skip_all, fields(admin = %admin.email))]
async fn upload_logo(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    mut multipart: Multipart,
) -> Result<Json<OrganizationSettings>, AppError> {
    let file = read_logo(&mut multipart).await?;
    let url = upload_validated(state.uploader(), &file, state.upload_folder()).await?;

    let patch = OrganizationSettingsPatch {
        logo: Some(url),
        ..OrganizationSettingsPatch::default()
    };
    let settings = SettingsStore::<OrganizationSettings>::new(state.store())
        .update_with(&patch)
        .await?;
    Ok(Json(settings))
}

async fn read_logo(multipart: &mut Multipart) -> Result<UploadFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some(LOGO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("logo").to_owned();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("could not read upload: {e}")))?;

        return Ok(UploadFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::BadRequest(format!(
        "missing `{LOGO_FIELD}` field"
    )))
}

/// Application settings, or the defaults if none are stored.
async fn get_application(
    State(state): State<AppState>,
) -> Result<Json<ApplicationSettings>, AppError> {
    let settings = SettingsStore::<ApplicationSettings>::new(state.store())
        .get()
        .await?;
    Ok(Json(settings))
}

/// Merge a partial update into the application settings.
#[instrument(skip_all, fields(admin = %admin.email))]
async fn update_application(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Json(partial): Json<Map<String, Value>>,
) -> Result<Json<ApplicationSettings>, AppError> {
    let settings = SettingsStore::<ApplicationSettings>::new(state.store())
        .update_validated(partial)
        .await?;
    Ok(Json(settings))
}
