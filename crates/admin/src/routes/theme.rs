//! Theme palette routes.
//!
//! The palette is derived on every request from the stored organization
//! theme.

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};

use libris_core::{OrganizationSettings, Theme, ThemePalette};

use crate::db::SettingsStore;
use crate::error::AppError;
use crate::state::AppState;

/// Build the theme router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/theme", get(palette_json))
        .route("/theme.css", get(palette_css))
}

/// Palette for the stored theme.
///
/// A stored colour that does not parse (for example a `Secondary` dropped by
/// a partial `Theme` update) falls back to the default theme.
async fn current_palette(state: &AppState) -> Result<ThemePalette, AppError> {
    let settings = SettingsStore::<OrganizationSettings>::new(state.store())
        .get()
        .await?;

    match ThemePalette::from_theme(&settings.theme) {
        Ok(palette) => Ok(palette),
        Err(e) => {
            tracing::warn!(error = %e, "Stored theme is invalid; using default palette");
            ThemePalette::from_theme(&Theme::default())
                .map_err(|e| AppError::Internal(format!("default theme is invalid: {e}")))
        }
    }
}

async fn palette_json(State(state): State<AppState>) -> Result<Json<ThemePalette>, AppError> {
    Ok(Json(current_palette(&state).await?))
}

async fn palette_css(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let palette = current_palette(&state).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        palette.to_css(),
    ))
}
