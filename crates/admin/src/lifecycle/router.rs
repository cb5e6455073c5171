//! Phase dispatch.
//!
//! The router probes, hands the phase to exactly one [`PhaseHandler`]
//! method, and waits for a [`Signal`]. Every signal leads to a fresh probe;
//! the router never assumes which phase comes next.
//!
//! Handler completions, external signals and session changes from the
//! [`AuthContext`] arrive through one loop and are processed one at a time.
//! A session change while a handler is still waiting drops that handler's
//! future and re-probes.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use libris_core::Phase;

use super::StateProber;
use crate::services::auth::{AuthContext, AuthSession};

/// Why the router should re-probe (or stop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The initializer finished.
    Initialized,
    /// A session was opened.
    SignedIn,
    /// Organization settings were saved.
    Configured,
    /// Probe again after an error.
    Retry,
    /// The session changed outside the current handler.
    SessionChanged,
    /// Stop routing.
    Exit,
}

/// One entry point per non-terminal phase, plus the `Ready` hand-off.
///
/// A session change ends the running handler, including one the handler
/// makes itself. Handlers that sign in should finish their store writes,
/// publish the session last (see [`AuthContext::open`]) and return.
#[async_trait]
pub trait PhaseHandler: Send {
    /// No marker exists: run first-time setup.
    async fn initialize(&mut self) -> Signal;

    /// Initialized, but nobody is signed in.
    async fn authenticate(&mut self) -> Signal;

    /// Signed in, organization not yet configured.
    async fn configure(&mut self, session: &AuthSession) -> Signal;

    /// The probe failed.
    async fn recover(&mut self, message: &str) -> Signal;

    /// Setup is complete. The router stops after this returns.
    async fn ready(&mut self, session: &AuthSession);
}

/// Drives a [`PhaseHandler`] until the system is ready or it asks to exit.
pub struct PhaseRouter<'a, H> {
    prober: StateProber<'a>,
    handler: H,
    session: watch::Receiver<Option<AuthSession>>,
    signals_tx: mpsc::UnboundedSender<Signal>,
    signals_rx: mpsc::UnboundedReceiver<Signal>,
    phase: watch::Sender<Phase>,
}

impl<'a, H: PhaseHandler> PhaseRouter<'a, H> {
    /// Create a router. Session changes on `auth` become
    /// [`Signal::SessionChanged`].
    #[must_use]
    pub fn new(prober: StateProber<'a>, auth: &AuthContext, handler: H) -> Self {
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let (phase, _) = watch::channel(Phase::NeedsInitialization);
        Self {
            prober,
            handler,
            session: auth.subscribe(),
            signals_tx,
            signals_rx,
            phase,
        }
    }

    /// A sender for external signals (e.g. [`Signal::Exit`] on Ctrl-C).
    #[must_use]
    pub fn signal_sender(&self) -> mpsc::UnboundedSender<Signal> {
        self.signals_tx.clone()
    }

    /// Observe the current phase.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Run until `Ready` has been handed off or a handler returns
    /// [`Signal::Exit`]. Returns the last probed phase and the handler.
    pub async fn run(mut self) -> (Phase, H) {
        loop {
            // Marks the current session as seen; only later changes interrupt.
            let session = self.session.borrow_and_update().clone();
            let phase = self.prober.probe(session.as_ref()).await;
            self.phase.send_replace(phase.clone());
            tracing::info!(phase = %phase, "Dispatching phase");

            if let (Phase::Ready, Some(session)) = (&phase, session.as_ref()) {
                self.handler.ready(session).await;
                return (phase, self.handler);
            }

            let signal = tokio::select! {
                signal = dispatch(&mut self.handler, &phase, session.as_ref()) => signal,
                signal = next_external(&mut self.signals_rx, &mut self.session) => {
                    tracing::debug!(?signal, "Handler interrupted");
                    signal
                }
            };

            tracing::debug!(?signal, from = %phase, "Signal received");
            if signal == Signal::Exit {
                return (phase, self.handler);
            }
        }
    }
}

async fn dispatch<H: PhaseHandler>(
    handler: &mut H,
    phase: &Phase,
    session: Option<&AuthSession>,
) -> Signal {
    match (phase, session) {
        (Phase::NeedsInitialization, _) => handler.initialize().await,
        (Phase::NeedsAuthentication, _) => handler.authenticate().await,
        (Phase::NeedsConfiguration, Some(session)) => handler.configure(session).await,
        (Phase::Error { message }, _) => handler.recover(message).await,
        // The prober only reports these with a session; probe again.
        (Phase::NeedsConfiguration | Phase::Ready, _) => Signal::Retry,
    }
}

async fn next_external(
    signals: &mut mpsc::UnboundedReceiver<Signal>,
    session: &mut watch::Receiver<Option<AuthSession>>,
) -> Signal {
    tokio::select! {
        Some(signal) = signals.recv() => signal,
        Ok(()) = session.changed() => Signal::SessionChanged,
        else => std::future::pending().await,
    }
}
