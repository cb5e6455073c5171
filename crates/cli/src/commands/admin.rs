//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin (password read from stdin)
//! echo "$PASSWORD" | libris admin create -e staff@library.org -n "Staff" -r admin
//!
//! # List admins
//! libris admin list
//! ```

use libris_admin::config::BackendConfig;
use libris_admin::db::{AdminAccountRepository, AdminProfile};
use libris_admin::services::auth::sign_up_or_sign_in;
use libris_admin::state::auth_provider;
use libris_core::AdminRole;

use super::{CommandError, connect, parse_email, say, stdin_prompt};

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `role` - Admin's role (`super_admin` or `admin`)
pub async fn create_user(email: &str, name: &str, role: &str) -> Result<(), CommandError> {
    // Parse and validate role
    let role: AdminRole = role
        .parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))?;
    let email = parse_email(email)?;

    let store = connect().await?;
    let repository = AdminAccountRepository::new(&store);
    if repository.get(&email).await?.is_some() {
        return Err(CommandError::AdminExists(email.to_string()));
    }

    let provider = auth_provider(&BackendConfig::from_env()?);
    let password = stdin_prompt().password("Password").await?;
    let session = sign_up_or_sign_in(provider.as_ref(), &email, &password, name).await?;

    tracing::info!("Creating admin user: {} ({})", email, role);
    let account = repository
        .create(
            &AdminProfile {
                name: name.to_owned(),
                email,
                uid: Some(session.uid),
            },
            role,
        )
        .await?;

    say(&format!(
        "Admin user created. Email: {}, Role: {}",
        account.email, account.role
    ));
    Ok(())
}

/// List admin users.
pub async fn list_users() -> Result<(), CommandError> {
    let store = connect().await?;
    let admins = AdminAccountRepository::new(&store).list().await?;

    if admins.is_empty() {
        say("No admin users.");
        return Ok(());
    }

    for admin in admins {
        let last_login = admin
            .last_login
            .map_or_else(|| "never".to_owned(), |at| at.to_rfc3339());
        say(&format!(
            "{:<32} {:<12} {:<24} last login: {last_login}",
            admin.email.as_str(),
            admin.role.to_string(),
            admin.name
        ));
    }
    Ok(())
}
