//! Bootstrap lifecycle.
//!
//! - [`StateProber`] derives the current [`Phase`](libris_core::Phase) from
//!   the store and the caller's session
//! - [`Initializer`] seeds a fresh store in one atomic batch
//! - [`PhaseRouter`] dispatches one handler per phase and re-probes on every
//!   signal

pub mod initializer;
pub mod prober;
pub mod router;

pub use initializer::Initializer;
pub use prober::StateProber;
pub use router::{PhaseHandler, PhaseRouter, Signal};

use thiserror::Error;

use crate::store::StoreError;

/// Errors from lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Reading the store failed before anything was written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The initialization marker already exists.
    #[error("the system is already initialized")]
    AlreadyInitialized,

    /// The bootstrap batch failed; nothing was written.
    #[error("initialization failed")]
    InitializationFailed(#[source] StoreError),
}
