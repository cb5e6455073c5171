//! Interactive setup wizard.
//!
//! Walks an installation from an empty store to `ready`: create the root
//! administrator, sign in, then enter the organization's name and contact
//! email. Each step is one [`PhaseHandler`] entry point; the
//! [`PhaseRouter`] decides which one runs.

use async_trait::async_trait;
use tokio::io::AsyncBufRead;

use libris_admin::config::BackendConfig;
use libris_admin::db::{AdminAccountRepository, AdminProfile, SettingsStore};
use libris_admin::lifecycle::{Initializer, PhaseHandler, PhaseRouter, Signal, StateProber};
use libris_admin::services::{AuthContext, AuthSession};
use libris_admin::services::auth::sign_up_or_sign_in;
use libris_admin::state::auth_provider;
use libris_admin::store::DocumentStore;
use libris_core::{
    Contact, OrganizationSettings, OrganizationSettingsPatch, Phase, to_partial,
};

use super::{
    CommandError, Prompt, connect, parse_email, say, stdin_prompt,
};

/// Run the wizard against the configured database.
pub async fn run() -> Result<(), CommandError> {
    let store = connect().await?;
    let auth = AuthContext::new(auth_provider(&BackendConfig::from_env()?));

    let phase = run_wizard(&store, auth, stdin_prompt()).await;
    if phase != Phase::Ready {
        say(&format!("Setup stopped at phase: {phase}"));
    }
    Ok(())
}

/// Drive the wizard until `ready` or end of input. Returns the last phase.
pub async fn run_wizard<R>(store: &dyn DocumentStore, auth: AuthContext, prompt: Prompt<R>) -> Phase
where
    R: AsyncBufRead + Unpin + Send,
{
    let handler = SetupWizard {
        store,
        auth: auth.clone(),
        prompt,
    };
    let router = PhaseRouter::new(StateProber::new(store), &auth, handler);

    // Ctrl-C stops the wizard at the next signal.
    let signals = router.signal_sender();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = signals.send(Signal::Exit);
        }
    });

    let (phase, _) = router.run().await;
    ctrl_c.abort();
    phase
}

/// Console [`PhaseHandler`].
///
/// Every step opens its session last so that its own store writes are
/// not cut short by the session change.
pub struct SetupWizard<'a, R> {
    store: &'a dyn DocumentStore,
    auth: AuthContext,
    prompt: Prompt<R>,
}

impl<R: AsyncBufRead + Unpin + Send> SetupWizard<'_, R> {
    async fn create_root_admin(&mut self) -> Result<AuthSession, CommandError> {
        let name = self.prompt.require("Your name").await?;
        let email = parse_email(&self.prompt.require("Email").await?)?;
        let password = self.prompt.password("Password").await?;

        let session =
            sign_up_or_sign_in(self.auth.provider().as_ref(), &email, &password, &name).await?;
        Initializer::new(self.store)
            .initialize(&AdminProfile {
                name,
                email,
                uid: Some(session.uid.clone()),
            })
            .await?;
        Ok(session)
    }

    async fn sign_in(&mut self) -> Result<Option<AuthSession>, CommandError> {
        let email = parse_email(&self.prompt.require("Email").await?)?;
        let password = self.prompt.password("Password").await?;

        if AdminAccountRepository::new(self.store)
            .get(&email)
            .await?
            .is_none()
        {
            say("No administrator account exists for that email.");
            return Ok(None);
        }

        let session = self.auth.provider().sign_in(&email, &password).await?;
        Ok(Some(session))
    }

    async fn save_organization(&mut self) -> Result<(), CommandError> {
        let name = self.prompt.require("Organization name").await?;
        let email = self.prompt.require("Contact email").await?;
        let phone = self.prompt.require("Contact phone (optional)").await?;

        let patch = OrganizationSettingsPatch {
            name: Some(name),
            contact: Some(Contact {
                email,
                phone,
                ..Contact::default()
            }),
            ..OrganizationSettingsPatch::default()
        };
        SettingsStore::<OrganizationSettings>::new(self.store)
            .update_validated(to_partial(&patch)?)
            .await?;
        Ok(())
    }
}

/// Report a failed step. End of input stops the wizard.
fn failed(error: &CommandError) -> Signal {
    if matches!(error, CommandError::InputClosed(_)) {
        return Signal::Exit;
    }
    say(&format!("Error: {error}"));
    Signal::Retry
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> PhaseHandler for SetupWizard<'_, R> {
    async fn initialize(&mut self) -> Signal {
        say("This installation has not been initialized. Create the root administrator.");
        match self.create_root_admin().await {
            Ok(session) => {
                say("Initialized.");
                self.auth.open(session);
                Signal::Initialized
            }
            Err(e) => failed(&e),
        }
    }

    async fn authenticate(&mut self) -> Signal {
        say("Sign in as an administrator.");
        match self.sign_in().await {
            Ok(Some(session)) => {
                self.auth.open(session);
                Signal::SignedIn
            }
            Ok(None) => Signal::Retry,
            Err(e) => failed(&e),
        }
    }

    async fn configure(&mut self, session: &AuthSession) -> Signal {
        say(&format!(
            "Signed in as {}. Describe your organization.",
            session.email
        ));
        match self.save_organization().await {
            Ok(()) => Signal::Configured,
            Err(e) => failed(&e),
        }
    }

    async fn recover(&mut self, message: &str) -> Signal {
        say(&format!("Could not determine setup state: {message}"));
        match self.prompt.ask("Press Enter to retry, or q to quit").await {
            Ok(Some(answer)) if answer != "q" => Signal::Retry,
            _ => Signal::Exit,
        }
    }

    async fn ready(&mut self, session: &AuthSession) {
        if let Err(e) = AdminAccountRepository::new(self.store)
            .record_login(&session.email)
            .await
        {
            tracing::warn!(error = %e, "Could not record login");
        }

        match SettingsStore::<OrganizationSettings>::new(self.store).get().await {
            Ok(organization) => say(&format!("Setup complete for {}.", organization.name)),
            Err(_) => say("Setup complete."),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use libris_admin::services::auth::LocalAuthProvider;
    use libris_admin::store::MemoryDocumentStore;
    use libris_core::Email;

    use super::*;

    fn context() -> AuthContext {
        AuthContext::new(Arc::new(LocalAuthProvider::new()))
    }

    #[tokio::test]
    async fn test_wizard_reaches_ready_from_empty_store() {
        let store = MemoryDocumentStore::new();
        let input: &[u8] = b"Ada\nada@library.org\ncorrect horse\n\
                             Central Library\ndesk@library.org\n555-0100\n";

        let phase = run_wizard(&store, context(), Prompt::new(input)).await;
        assert_eq!(phase, Phase::Ready);

        let organization = SettingsStore::<OrganizationSettings>::new(&store)
            .get()
            .await
            .unwrap();
        assert_eq!(organization.name, "Central Library");
        assert_eq!(organization.contact.phone, "555-0100");

        let admin = AdminAccountRepository::new(&store)
            .get(&Email::parse("ada@library.org").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(admin.last_login.is_some());
    }

    #[tokio::test]
    async fn test_wizard_retries_invalid_contact_email() {
        let store = MemoryDocumentStore::new();
        let input: &[u8] = b"Ada\nada@library.org\ncorrect horse\n\
                             Central Library\nnot-an-email\n\n\
                             Central Library\ndesk@library.org\n\n";

        let phase = run_wizard(&store, context(), Prompt::new(input)).await;
        assert_eq!(phase, Phase::Ready);
    }

    #[tokio::test]
    async fn test_wizard_stops_at_end_of_input() {
        let store = MemoryDocumentStore::new();
        let input: &[u8] = b"Ada\n";

        let phase = run_wizard(&store, context(), Prompt::new(input)).await;
        assert_eq!(phase, Phase::NeedsInitialization);
        assert!(store.is_empty().await);
    }
}
