//! Non-interactive initialization.
//!
//! # Usage
//!
//! ```bash
//! echo "$ROOT_PASSWORD" | libris init -e root@library.org -n "Root Admin"
//! ```

use libris_admin::config::BackendConfig;
use libris_admin::db::AdminProfile;
use libris_admin::lifecycle::Initializer;
use libris_admin::services::auth::sign_up_or_sign_in;
use libris_admin::state::auth_provider;

use super::{CommandError, connect, parse_email, say, stdin_prompt};

/// Create the root administrator and the default documents.
pub async fn run(email: &str, name: &str) -> Result<(), CommandError> {
    let email = parse_email(email)?;
    let backend = BackendConfig::from_env()?;
    let provider = auth_provider(&backend);
    if backend.auth.is_none() {
        tracing::warn!(
            "No auth provider configured; the root account will only exist for this command"
        );
    }

    let store = connect().await?;
    let initializer = Initializer::new(&store);
    if initializer.is_initialized().await? {
        say("Already initialized; nothing to do.");
        return Ok(());
    }

    let password = stdin_prompt().password("Password").await?;
    let session = sign_up_or_sign_in(provider.as_ref(), &email, &password, name).await?;

    initializer
        .initialize(&AdminProfile {
            name: name.to_owned(),
            email: email.clone(),
            uid: Some(session.uid),
        })
        .await?;

    say(&format!("Initialized. Root administrator: {email}"));
    Ok(())
}
