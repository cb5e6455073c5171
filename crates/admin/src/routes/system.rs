//! Health checks, phase and diagnostics.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use libris_core::Phase;

use crate::config::Diagnostic;
use crate::lifecycle::StateProber;
use crate::middleware::{OptionalAdminAuth, RequireAdminAuth};
use crate::state::AppState;

/// Build the system router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/api/system/phase", get(phase))
        .route("/api/system/diagnostics", get(diagnostics))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the document store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Current lifecycle phase for the caller's session.
///
/// Probe failures are reported as the `error` phase with status 200 so the
/// client can offer a retry.
async fn phase(
    State(state): State<AppState>,
    OptionalAdminAuth(admin): OptionalAdminAuth,
) -> Json<Phase> {
    let phase = StateProber::new(state.store())
        .probe_signed_in(admin.is_some())
        .await;
    Json(phase)
}

/// Active backends plus the configuration report.
#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub store: &'static str,
    pub auth: &'static str,
    pub uploader: &'static str,
    pub components: Vec<Diagnostic>,
}

/// Which backends are active and what configuration is missing.
async fn diagnostics(
    State(state): State<AppState>,
    RequireAdminAuth(_admin): RequireAdminAuth,
) -> Json<DiagnosticsResponse> {
    Json(DiagnosticsResponse {
        store: state.store().backend_name(),
        auth: state.auth().provider_name(),
        uploader: state.uploader().uploader_name(),
        components: state.diagnostics().to_vec(),
    })
}
