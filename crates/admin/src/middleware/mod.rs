//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions)
//!
//! Authentication is enforced per route through the extractors in [`auth`].

pub mod auth;
pub mod session;

pub use auth::{
    OptionalAdminAuth, RequireAdminAuth, RequireSuperAdmin, clear_current_admin,
    set_current_admin,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_layer};
