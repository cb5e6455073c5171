//! Libris Core - Shared domain types.
//!
//! This crate provides the types shared by every Libris component:
//! - `admin` - Settings backend (HTTP API, bootstrap lifecycle)
//! - `cli` - Command-line tools for migrations, setup and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Stored documents are plain serde types;
//! the admin crate decides where they live.
//!
//! # Modules
//!
//! - [`types`] - Email addresses, admin roles and lifecycle phases
//! - [`documents`] - Document addresses, the initialization marker and admin accounts
//! - [`settings`] - Organization, application and notification settings aggregates
//! - [`theme`] - Pure hex-to-palette transform for the organization theme

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod documents;
pub mod settings;
pub mod theme;
pub mod types;

pub use documents::*;
pub use settings::*;
pub use theme::{ThemeError, ThemePalette};
pub use types::*;
