//! Administrator account repository.
//!
//! Accounts are stored at `admins/<normalized email>`, so writing the same
//! email twice addresses the same document.

use chrono::Utc;
use tracing::instrument;

use libris_core::{ADMINS_COLLECTION, AdminAccount, AdminRole, DocumentPath, Email};

use crate::store::{DocumentStore, StoreError, from_document, get_typed, set_typed};

/// Who is being made an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProfile {
    pub name: String,
    pub email: Email,
    /// Account id assigned by the auth provider, when one exists.
    pub uid: Option<String>,
}

impl AdminProfile {
    /// The account id to store: the provider uid, or the normalized email.
    #[must_use]
    pub fn account_id(&self) -> String {
        self.uid
            .clone()
            .unwrap_or_else(|| self.email.as_str().to_owned())
    }
}

/// Repository for administrator account documents.
pub struct AdminAccountRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> AdminAccountRepository<'a> {
    /// Create a new admin account repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// List all administrators, ordered by email.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store fails or a document is malformed.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<AdminAccount>, StoreError> {
        self.store
            .list(ADMINS_COLLECTION)
            .await?
            .into_iter()
            .map(|(id, document)| {
                from_document(&DocumentPath::new(ADMINS_COLLECTION, id), document)
            })
            .collect()
    }

    /// Get an administrator by email.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store fails or the document is malformed.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get(&self, email: &Email) -> Result<Option<AdminAccount>, StoreError> {
        get_typed(self.store, &DocumentPath::admin(email)).await
    }

    /// Create an administrator with the given role.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if an account with this email exists.
    #[instrument(skip(self, profile), fields(email = %profile.email, role = %role))]
    pub async fn create(
        &self,
        profile: &AdminProfile,
        role: AdminRole,
    ) -> Result<AdminAccount, StoreError> {
        if self.get(&profile.email).await?.is_some() {
            return Err(StoreError::Conflict(format!(
                "an administrator with email {} already exists",
                profile.email
            )));
        }

        let account = AdminAccount {
            id: profile.account_id(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            role,
            created_at: Utc::now(),
            last_login: None,
            updated_at: None,
        };
        set_typed(self.store, &DocumentPath::admin(&account.email), &account).await?;

        tracing::info!(email = %account.email, role = %account.role, "Administrator created");
        Ok(account)
    }

    /// Stamp a successful sign-in. Returns the updated account, or `None`
    /// if no account exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn record_login(&self, email: &Email) -> Result<Option<AdminAccount>, StoreError> {
        let Some(mut account) = self.get(email).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        account.last_login = Some(now);
        account.updated_at = Some(now);
        set_typed(self.store, &DocumentPath::admin(email), &account).await?;

        Ok(Some(account))
    }
}
