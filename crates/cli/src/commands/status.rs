//! Lifecycle status.
//!
//! The CLI has no session, so the phase is reported as a signed-in admin
//! would see it.

use libris_admin::lifecycle::StateProber;
use libris_admin::store::get_typed;
use libris_core::{DocumentPath, InitializationMarker, Phase};

use super::{CommandError, connect, say};

/// Print the phase and, once initialized, the marker details.
pub async fn run() -> Result<(), CommandError> {
    let store = connect().await?;

    let phase = StateProber::new(&store).probe_signed_in(true).await;
    say(&format!("Phase: {phase}"));

    if let Phase::Error { message } = &phase {
        say(&format!("Probe failed: {message}"));
        return Ok(());
    }

    let marker: Option<InitializationMarker> =
        get_typed(&store, &DocumentPath::initialization_marker()).await?;
    match marker {
        Some(marker) => {
            say(&format!("Initialized at: {}", marker.initialized_at.to_rfc3339()));
            say(&format!("Initialized by: {}", marker.initialized_by));
            say(&format!("Schema version: {}", marker.version));
        }
        None => say("Not initialized. Run `libris setup` or `libris init`."),
    }
    Ok(())
}
