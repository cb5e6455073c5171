//! Phase derivation.

use tracing::instrument;

use libris_core::{DocumentPath, OrganizationSettings, Phase};

use crate::db::SettingsStore;
use crate::services::auth::AuthSession;
use crate::store::DocumentStore;

/// Derives the lifecycle phase. Read-only.
pub struct StateProber<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> StateProber<'a> {
    /// Create a prober over `store`.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Derive the phase for a caller holding `session`.
    ///
    /// Store failures become [`Phase::Error`]; callers retry by probing again.
    pub async fn probe(&self, session: Option<&AuthSession>) -> Phase {
        self.probe_signed_in(session.is_some()).await
    }

    /// Derive the phase for a caller that is or is not signed in.
    #[instrument(skip(self))]
    pub async fn probe_signed_in(&self, signed_in: bool) -> Phase {
        let phase = match self.derive(signed_in).await {
            Ok(phase) => phase,
            Err(message) => {
                tracing::warn!(error = %message, "Phase probe failed");
                Phase::Error { message }
            }
        };
        tracing::debug!(phase = %phase, "Phase probed");
        phase
    }

    async fn derive(&self, signed_in: bool) -> Result<Phase, String> {
        let marker = self
            .store
            .get(&DocumentPath::initialization_marker())
            .await
            .map_err(|e| format!("Could not check initialization status: {e}"))?;

        if marker.is_none() {
            return Ok(Phase::NeedsInitialization);
        }
        if !signed_in {
            return Ok(Phase::NeedsAuthentication);
        }

        let organization = SettingsStore::<OrganizationSettings>::new(self.store)
            .get()
            .await
            .map_err(|e| format!("Could not load organization settings: {e}"))?;

        if organization.is_configured() {
            Ok(Phase::Ready)
        } else {
            Ok(Phase::NeedsConfiguration)
        }
    }
}
