//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::db::SettingsError;
use crate::lifecycle::LifecycleError;
use crate::services::{AuthError, MediaError};
use crate::store::StoreError;

/// Application-level error type for the settings API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Document store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Bootstrap operation failed.
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Authentication failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Upload failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Input failed field validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SettingsError> for AppError {
    fn from(error: SettingsError) -> Self {
        match error {
            SettingsError::Store(e) => Self::Store(e),
            SettingsError::Validation(e) => Self::Validation(e),
            SettingsError::InvalidUpdate(e) => Self::BadRequest(format!("invalid settings: {e}")),
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::Conflict(_))
            | Self::Lifecycle(LifecycleError::AlreadyInitialized)
            | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) | Self::Lifecycle(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(AuthError::EmailAlreadyInUse) => StatusCode::CONFLICT,
            Self::Auth(AuthError::TooManyAttempts) => StatusCode::TOO_MANY_REQUESTS,
            Self::Auth(AuthError::WeakPassword | AuthError::InvalidEmail) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Auth(AuthError::Transport(_) | AuthError::Provider(_)) => StatusCode::BAD_GATEWAY,
            Self::Auth(_) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Media(MediaError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Media(MediaError::UnsupportedType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Media(MediaError::Empty) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Media(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Message safe to return to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Store(StoreError::Conflict(message)) => message.clone(),
            Self::Store(StoreError::Unavailable(_)) => "Service temporarily unavailable".to_string(),
            Self::Store(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Lifecycle(LifecycleError::AlreadyInitialized) => {
                "The system is already initialized".to_string()
            }
            Self::Lifecycle(_) => "Initialization failed".to_string(),
            Self::Auth(e) => e.user_message().to_string(),
            Self::Media(MediaError::Transport(_) | MediaError::Upload { .. }) => {
                "Upload service error".to_string()
            }
            Self::Media(e) => e.to_string(),
            Self::Validation(_) => "Validation failed".to_string(),
            Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::Forbidden(_)
            | Self::BadRequest(_)
            | Self::Conflict(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = match &self {
            Self::Validation(errors) => json!({
                "error": self.public_message(),
                "fields": errors,
            }),
            _ => json!({ "error": self.public_message() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Set the Sentry user context for the signed-in admin.
pub fn set_sentry_user(admin_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
