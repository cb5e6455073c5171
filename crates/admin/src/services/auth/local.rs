//! In-process account provider.
//!
//! Accounts live in memory with Argon2id password hashes and disappear when
//! the process exits. Used when no hosted provider is configured.

use std::collections::HashMap;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use uuid::Uuid;

use libris_core::Email;

use super::{AuthError, AuthProvider, AuthSession};

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LENGTH: u64 = 8;

struct LocalAccount {
    uid: String,
    password_hash: String,
    display_name: String,
}

/// Argon2-backed in-memory accounts.
#[derive(Default)]
pub struct LocalAuthProvider {
    accounts: RwLock<HashMap<Email, LocalAccount>>,
}

impl LocalAuthProvider {
    /// Create a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Provider(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::Provider(format!("stored hash is invalid: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Provider(e.to_string())),
    }
}

/// Run Argon2 work off the async workers.
async fn run_blocking<T, F>(task: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AuthError::Provider(format!("password task failed: {e}")))?
}

fn session_for(email: &Email, account: &LocalAccount) -> AuthSession {
    AuthSession {
        uid: account.uid.clone(),
        email: email.clone(),
        display_name: Some(account.display_name.clone()),
        id_token: SecretString::from(Uuid::new_v4().to_string()),
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, AuthError> {
        let (session, hash) = {
            let accounts = self.accounts.read().await;
            let account = accounts.get(email).ok_or(AuthError::UserNotFound)?;
            (session_for(email, account), account.password_hash.clone())
        };

        let password = SecretString::from(password.expose_secret());
        let verified =
            run_blocking(move || verify_password(password.expose_secret(), &hash)).await?;
        if !verified {
            return Err(AuthError::WrongPassword);
        }
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
        display_name: &str,
    ) -> Result<AuthSession, AuthError> {
        let length = password.expose_secret().chars().count();
        if u64::try_from(length).unwrap_or(u64::MAX) < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }
        if self.accounts.read().await.contains_key(email) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let plain = SecretString::from(password.expose_secret());
        let password_hash = run_blocking(move || hash_password(plain.expose_secret())).await?;

        // Checked again: another sign-up may have finished while hashing.
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let account = LocalAccount {
            uid: Uuid::new_v4().to_string(),
            password_hash,
            display_name: display_name.to_owned(),
        };
        let session = session_for(email, &account);
        accounts.insert(email.clone(), account);
        Ok(session)
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("ada@example.org").unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = LocalAuthProvider::new();
        let password = SecretString::from("correct horse battery");

        let created = provider.sign_up(&email(), &password, "Ada").await.unwrap();
        let signed_in = provider.sign_in(&email(), &password).await.unwrap();
        assert_eq!(created.uid, signed_in.uid);
        assert_eq!(signed_in.display_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let provider = LocalAuthProvider::new();
        provider
            .sign_up(&email(), &SecretString::from("correct horse battery"), "Ada")
            .await
            .unwrap();

        let err = provider
            .sign_in(&email(), &SecretString::from("wrong horse battery"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::WrongPassword);
    }

    #[tokio::test]
    async fn test_sign_up_rejections() {
        let provider = LocalAuthProvider::new();
        let weak = provider
            .sign_up(&email(), &SecretString::from("short"), "Ada")
            .await
            .unwrap_err();
        assert_eq!(weak, AuthError::WeakPassword);

        let password = SecretString::from("correct horse battery");
        provider.sign_up(&email(), &password, "Ada").await.unwrap();
        let duplicate = provider.sign_up(&email(), &password, "Ada").await.unwrap_err();
        assert_eq!(duplicate, AuthError::EmailAlreadyInUse);
    }

    #[tokio::test]
    async fn test_concurrent_sign_ups_create_one_account() {
        let provider = std::sync::Arc::new(LocalAuthProvider::new());
        let password = SecretString::from("correct horse battery");

        let first = {
            let provider = provider.clone();
            let password = SecretString::from(password.expose_secret());
            tokio::spawn(async move { provider.sign_up(&email(), &password, "Ada").await })
        };
        let second = provider.sign_up(&email(), &password, "Ada").await;
        let first = first.await.unwrap();

        assert!(first.is_ok() != second.is_ok());
        let signed_in = provider.sign_in(&email(), &password).await.unwrap();
        let created = first.or(second).unwrap();
        assert_eq!(signed_in.uid, created.uid);
    }
}
