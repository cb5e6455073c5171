//! Bootstrap lifecycle phases.

use serde::{Deserialize, Serialize};

/// The mutually exclusive lifecycle phases of a Libris installation.
///
/// Derived on demand from the document store and the caller's session;
/// never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// No initialization marker exists.
    NeedsInitialization,
    /// Initialized, but the caller has no authenticated session.
    NeedsAuthentication,
    /// Authenticated, but the organization is missing a name or contact email.
    NeedsConfiguration,
    /// Fully set up; hands off to the dashboard.
    Ready,
    /// A store query failed while probing.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

impl Phase {
    /// Returns `true` for [`Phase::Ready`], the only terminal phase.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Short machine-readable name, matching the serialized tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NeedsInitialization => "needs_initialization",
            Self::NeedsAuthentication => "needs_authentication",
            Self::NeedsConfiguration => "needs_configuration",
            Self::Ready => "ready",
            Self::Error { .. } => "error",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error { message } => write!(f, "error: {message}"),
            other => f.write_str(other.name()),
        }
    }
}
