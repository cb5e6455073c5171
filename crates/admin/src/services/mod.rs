//! External service adapters for admin.
//!
//! # Services
//!
//! - `auth` - Email/password accounts and per-client session context
//! - `media` - Logo uploads to the hosted media service

pub mod auth;
pub mod media;

pub use auth::{AuthContext, AuthError, AuthProvider, AuthSession};
pub use media::{MediaError, MediaUploader, UploadFile};
