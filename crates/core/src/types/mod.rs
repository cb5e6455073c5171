//! Core types for Libris.
//!
//! Type-safe wrappers for the few domain concepts shared across crates.

pub mod email;
pub mod phase;
pub mod role;

pub use email::{Email, EmailError};
pub use phase::Phase;
pub use role::AdminRole;
