//! First-run bootstrap.
//!
//! One atomic batch seeds the root administrator, the default settings
//! documents and one placeholder per business collection. The
//! initialization marker is the last write of the batch.

use chrono::Utc;
use tracing::instrument;

use libris_core::{
    AdminAccount, AdminRole, ApplicationSettings, BUSINESS_COLLECTIONS, DocumentPath,
    InitializationMarker, NotificationSettings, OrganizationSettings, PlaceholderDocument,
    SCHEMA_VERSION, SettingsDocument,
};

use super::LifecycleError;
use crate::db::AdminProfile;
use crate::store::{DocumentStore, StoreError, WriteBatch};

/// Fields stamped with the store's clock at commit.
const CREATED_AT: &str = "createdAt";
const INITIALIZED_AT: &str = "initializedAt";

/// Seeds an empty store.
pub struct Initializer<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> Initializer<'a> {
    /// Create an initializer over `store`.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Whether the initialization marker exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be read.
    pub async fn is_initialized(&self) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(&DocumentPath::initialization_marker())
            .await?
            .is_some())
    }

    /// Seed the store with `admin` as the root (`super_admin`) account.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::AlreadyInitialized` if the marker exists, or
    /// `LifecycleError::InitializationFailed` if the batch fails, in which
    /// case nothing was written.
    #[instrument(skip(self, admin), fields(email = %admin.email))]
    pub async fn initialize(&self, admin: &AdminProfile) -> Result<(), LifecycleError> {
        if self.is_initialized().await? {
            return Err(LifecycleError::AlreadyInitialized);
        }

        let batch = bootstrap_batch(admin)?;
        let writes = batch.len();

        if let Err(e) = self.store.commit(batch).await {
            tracing::error!(error = %e, "Initialization batch failed");
            return Err(LifecycleError::InitializationFailed(e));
        }

        tracing::info!(writes, backend = self.store.backend_name(), "System initialized");
        Ok(())
    }
}

/// Build the bootstrap batch. The marker is queued last.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if a document fails to serialize.
pub fn bootstrap_batch(admin: &AdminProfile) -> Result<WriteBatch, StoreError> {
    // Placeholder timestamps; the store overwrites them at commit.
    let now = Utc::now();
    let mut batch = WriteBatch::new();

    let account = AdminAccount {
        id: admin.account_id(),
        email: admin.email.clone(),
        name: admin.name.clone(),
        role: AdminRole::SuperAdmin,
        created_at: now,
        last_login: None,
        updated_at: None,
    };
    batch.set_with_server_timestamps(DocumentPath::admin(&admin.email), &account, &[CREATED_AT])?;

    batch
        .set(ApplicationSettings::path(), &ApplicationSettings::default())?
        .set(OrganizationSettings::path(), &OrganizationSettings::default())?
        .set(NotificationSettings::path(), &NotificationSettings::default())?;

    for collection in BUSINESS_COLLECTIONS {
        batch.set_with_server_timestamps(
            DocumentPath::placeholder(collection),
            &PlaceholderDocument {
                placeholder: true,
                created_at: now,
            },
            &[CREATED_AT],
        )?;
    }

    batch.set_with_server_timestamps(
        DocumentPath::initialization_marker(),
        &InitializationMarker {
            initialized: true,
            initialized_at: now,
            initialized_by: admin.email.as_str().to_owned(),
            version: SCHEMA_VERSION.to_owned(),
        },
        &[INITIALIZED_AT],
    )?;

    Ok(batch)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use libris_core::Email;

    use super::*;
    use crate::store::{MemoryDocumentStore, get_typed};

    fn admin() -> AdminProfile {
        AdminProfile {
            name: "A".to_owned(),
            email: Email::parse("a@b.com").unwrap(),
            uid: None,
        }
    }

    #[test]
    fn test_batch_layout() {
        let batch = bootstrap_batch(&admin()).unwrap();
        let paths: Vec<String> = batch.writes().iter().map(|w| w.path.to_string()).collect();

        assert_eq!(paths.len(), 1 + 3 + BUSINESS_COLLECTIONS.len() + 1);
        assert_eq!(paths.first().unwrap(), "admins/a@b.com");
        assert_eq!(paths.last().unwrap(), "system/initialization");
        assert!(paths.contains(&"settings/organization".to_owned()));
        assert!(paths.contains(&"theses/_placeholder".to_owned()));
    }

    #[tokio::test]
    async fn test_initialize_writes_marker_and_root_admin() {
        let store = MemoryDocumentStore::new();
        Initializer::new(&store).initialize(&admin()).await.unwrap();

        let marker: InitializationMarker =
            get_typed(&store, &DocumentPath::initialization_marker())
                .await
                .unwrap()
                .unwrap();
        assert!(marker.initialized);
        assert_eq!(marker.initialized_by, "a@b.com");
        assert_eq!(marker.version, SCHEMA_VERSION);

        let account: AdminAccount = get_typed(&store, &DocumentPath::admin(&admin().email))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.role, AdminRole::SuperAdmin);
    }

    #[tokio::test]
    async fn test_second_initialize_is_rejected() {
        let store = MemoryDocumentStore::new();
        let initializer = Initializer::new(&store);
        initializer.initialize(&admin()).await.unwrap();

        let err = initializer.initialize(&admin()).await.unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyInitialized));
    }
}
