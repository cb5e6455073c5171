//! Administrator authentication.
//!
//! Email/password accounts live with an external provider behind the
//! [`AuthProvider`] trait. [`AuthContext`] holds the current session for one
//! client and publishes every change to subscribers.
//!
//! # Providers
//!
//! - [`IdentityToolkitProvider`] - hosted Identity Toolkit REST API
//! - [`LocalAuthProvider`] - in-process Argon2 accounts (development, tests)

mod error;
pub mod identity;
pub mod local;

pub use error::AuthError;
pub use identity::IdentityToolkitProvider;
pub use local::LocalAuthProvider;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::instrument;

use libris_core::Email;

/// A signed-in account.
#[derive(Clone)]
pub struct AuthSession {
    /// Provider account id.
    pub uid: String,
    pub email: Email,
    pub display_name: Option<String>,
    /// Provider-issued token for the session.
    pub id_token: SecretString,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

/// An email/password account provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify credentials and open a session.
    async fn sign_in(&self, email: &Email, password: &SecretString)
    -> Result<AuthSession, AuthError>;

    /// Create an account and open a session for it.
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        display_name: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Provider name for logs and diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Create the account, or sign in to it if it already exists.
///
/// An earlier attempt may have created the account and then failed on a
/// later step. The password must match the existing account.
///
/// # Errors
///
/// Returns the provider's [`AuthError`].
#[instrument(skip_all, fields(email = %email))]
pub async fn sign_up_or_sign_in(
    provider: &dyn AuthProvider,
    email: &Email,
    password: &SecretString,
    display_name: &str,
) -> Result<AuthSession, AuthError> {
    match provider.sign_up(email, password, display_name).await {
        Err(AuthError::EmailAlreadyInUse) => {
            tracing::info!("Auth account exists; signing in instead");
            provider.sign_in(email, password).await
        }
        result => result,
    }
}

/// The session state of one client.
///
/// Cloning shares the same session; every clone sees sign-in and sign-out
/// from any other.
#[derive(Clone)]
pub struct AuthContext {
    provider: Arc<dyn AuthProvider>,
    session: Arc<watch::Sender<Option<AuthSession>>>,
}

impl AuthContext {
    /// Create a signed-out context over `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            provider,
            session: Arc::new(session),
        }
    }

    /// The provider this context signs in against.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn AuthProvider> {
        &self.provider
    }

    /// The current session, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<AuthSession> {
        self.session.borrow().clone()
    }

    /// Sign in and make the result the current session.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`AuthError`]; the current session is unchanged.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let session = self.provider.sign_in(email, password).await?;
        self.session.send_replace(Some(session.clone()));
        tracing::info!(uid = %session.uid, "Signed in");
        Ok(session)
    }

    /// Create an account, then make it the current session.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`AuthError`]; the current session is unchanged.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        display_name: &str,
    ) -> Result<AuthSession, AuthError> {
        let session = self.provider.sign_up(email, password, display_name).await?;
        self.session.send_replace(Some(session.clone()));
        tracing::info!(uid = %session.uid, "Account created and signed in");
        Ok(session)
    }

    /// Make a session obtained directly from the provider current.
    ///
    /// Lets a caller finish dependent writes before observers see the
    /// session change.
    pub fn open(&self, session: AuthSession) {
        tracing::info!(uid = %session.uid, "Session opened");
        self.session.send_replace(Some(session));
    }

    /// Drop the current session. Also used when the session is invalidated
    /// from outside (expired token, revoked account).
    pub fn sign_out(&self) {
        if self.session.send_replace(None).is_some() {
            tracing::info!("Signed out");
        }
    }

    /// Receive every subsequent session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.session.subscribe()
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("provider", &self.provider.provider_name())
            .field("session", &self.current())
            .finish()
    }
}
