//! Request-scoped models for admin.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
