//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (document store reachable)
//!
//! # System
//! GET  /api/system/phase               - Lifecycle phase for this session
//! GET  /api/system/diagnostics         - Configuration report (auth required)
//!
//! # Setup (first run only)
//! POST /api/setup/initialize           - Create the root admin and default documents
//!
//! # Auth (email/password)
//! POST /api/auth/login                 - Sign in
//! POST /api/auth/logout                - Sign out
//! GET  /api/auth/me                    - Current admin
//!
//! # Settings (writes require auth)
//! GET  /api/settings/organization      - Organization profile
//! PUT  /api/settings/organization      - Shallow-merge partial update
//! POST /api/settings/organization/logo - Multipart logo upload
//! GET  /api/settings/application       - Application settings
//! PUT  /api/settings/application       - Shallow-merge partial update
//!
//! # Theme
//! GET  /api/theme                      - Palette tokens
//! GET  /theme.css                      - Palette as CSS custom properties
//!
//! # Admin Users
//! GET  /api/admins                     - List admins (auth required)
//! POST /api/admins                     - Create admin (super admin only)
//! ```

use axum::Router;

use crate::state::AppState;

pub mod admin_users;
pub mod auth;
pub mod settings;
pub mod setup;
pub mod system;
pub mod theme;

/// Build the complete route tree.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(system::router())
        .merge(setup::router())
        .merge(auth::router())
        .merge(settings::router())
        .merge(theme::router())
        .merge(admin_users::router())
}

/// Map a session store failure to an internal error.
fn session_error(error: tower_sessions::session::Error) -> crate::error::AppError {
    crate::error::AppError::Internal(format!("session error: {error}"))
}
