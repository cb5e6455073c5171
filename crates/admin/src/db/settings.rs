//! Settings store.
//!
//! Read and shallow-merge update for the singleton settings aggregates. A
//! missing document is not an error: readers get the compiled-in default.

use std::marker::PhantomData;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;
use validator::{Validate, ValidationErrors};

use libris_core::settings::{SettingsDocument, shallow_merge, to_partial};

use crate::store::{Document, DocumentStore, StoreError, from_document, to_document};

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The merged document no longer deserializes into the aggregate.
    #[error("invalid settings update: {0}")]
    InvalidUpdate(#[from] serde_json::Error),

    /// The merged document deserializes but fails field validation.
    #[error("settings validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Typed access to one settings aggregate.
pub struct SettingsStore<'a, T> {
    store: &'a dyn DocumentStore,
    _aggregate: PhantomData<fn() -> T>,
}

impl<'a, T: SettingsDocument> SettingsStore<'a, T> {
    /// Create a settings store for aggregate `T`.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            _aggregate: PhantomData,
        }
    }

    /// The stored aggregate, or its default if it has never been written.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Store` on transport failure or if the stored
    /// document is malformed.
    #[instrument(skip(self), fields(document = T::DOCUMENT_ID))]
    pub async fn get(&self) -> Result<T, SettingsError> {
        let path = T::path();
        match self.store.get(&path).await? {
            Some(document) => Ok(from_document(&path, document)?),
            None => {
                tracing::debug!("Settings document absent, using defaults");
                Ok(T::default())
            }
        }
    }

    /// Shallow-merge `partial` over the current document and write it back.
    ///
    /// Every top-level key in `partial` replaces the stored key wholesale;
    /// nested objects are not merged.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidUpdate` if the merged document does not
    /// deserialize into `T`, or `SettingsError::Store` if the write fails.
    #[instrument(skip(self, partial), fields(document = T::DOCUMENT_ID, keys = partial.len()))]
    pub async fn update(&self, partial: Map<String, Value>) -> Result<T, SettingsError> {
        let (merged, document) = self.merge(partial).await?;
        self.write(document).await?;
        Ok(merged)
    }

    /// Apply a typed patch; only the fields it sets are merged.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub async fn update_with<P: Serialize>(&self, patch: &P) -> Result<T, SettingsError> {
        self.update(to_partial(patch)?).await
    }

    /// Like [`update`](Self::update), but the merged aggregate must also pass
    /// field validation before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Validation` with the per-field errors.
    #[instrument(skip(self, partial), fields(document = T::DOCUMENT_ID, keys = partial.len()))]
    pub async fn update_validated(&self, partial: Map<String, Value>) -> Result<T, SettingsError>
    where
        T: Validate,
    {
        let (merged, document) = self.merge(partial).await?;
        merged.validate()?;
        self.write(document).await?;
        Ok(merged)
    }

    async fn merge(&self, partial: Map<String, Value>) -> Result<(T, Document), SettingsError> {
        let mut document = match self.store.get(&T::path()).await? {
            Some(document) => document,
            None => to_document(&T::default())?,
        };
        shallow_merge(&mut document, partial);

        let merged: T = serde_json::from_value(Value::Object(document.clone()))?;
        merged.encode_stored_keys(&mut document)?;
        Ok((merged, document))
    }

    async fn write(&self, document: Document) -> Result<(), SettingsError> {
        self.store.set(&T::path(), document).await?;
        tracing::info!(document = T::DOCUMENT_ID, "Settings updated");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use libris_core::{
        ApplicationSettings, ApplicationSettingsPatch, Contact, OrganizationSettings,
        OrganizationSettingsPatch,
    };

    use super::*;
    use crate::store::MemoryDocumentStore;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_get_absent_returns_default() {
        let store = MemoryDocumentStore::new();
        let settings = SettingsStore::<OrganizationSettings>::new(&store);
        assert_eq!(settings.get().await.unwrap(), OrganizationSettings::default());
    }

    #[tokio::test]
    async fn test_update_keeps_untouched_keys() {
        let store = MemoryDocumentStore::new();
        let settings = SettingsStore::<OrganizationSettings>::new(&store);

        settings
            .update(object(json!({ "Name": "Central Library" })))
            .await
            .unwrap();
        let updated = settings
            .update(object(json!({ "Address": "1 Main St" })))
            .await
            .unwrap();

        assert_eq!(updated.name, "Central Library");
        assert_eq!(updated.address, "1 Main St");
        assert_eq!(settings.get().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_rejects_wrong_types_without_writing() {
        let store = MemoryDocumentStore::new();
        let settings = SettingsStore::<ApplicationSettings>::new(&store);

        let err = settings
            .update(object(json!({ "DefaultLoanDuration": "two weeks" })))
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidUpdate(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_with_typed_patch() {
        let store = MemoryDocumentStore::new();
        let settings = SettingsStore::<ApplicationSettings>::new(&store);

        let patch = ApplicationSettingsPatch {
            maintenance_mode: Some(true),
            ..ApplicationSettingsPatch::default()
        };
        let updated = settings.update_with(&patch).await.unwrap();
        assert!(updated.maintenance_mode);
        assert_eq!(updated.default_loan_duration, 14);
    }

    #[tokio::test]
    async fn test_structured_hours_are_stored_encoded() {
        let store = MemoryDocumentStore::new();
        let settings = SettingsStore::<OrganizationSettings>::new(&store);

        let mut partial = to_partial(&OrganizationSettingsPatch {
            name: Some("Central Library".to_owned()),
            contact: Some(Contact {
                email: "desk@central.org".to_owned(),
                ..Contact::default()
            }),
            ..OrganizationSettingsPatch::default()
        })
        .unwrap();
        partial.insert(
            "OpeningHours".to_owned(),
            json!({
                "Monday": { "open": "09:00", "close": "17:00" },
                "Saturday": { "open": "CLOSED", "close": "closed" },
                "Sunday": " {\"open\":\" 10:00\",\"close\":\"12:00\"}"
            }),
        );
        let updated = settings.update_validated(partial).await.unwrap();

        let stored = store
            .get(&OrganizationSettings::path())
            .await
            .unwrap()
            .unwrap();
        let hours = &stored["OpeningHours"];
        assert_eq!(hours["Monday"], json!("{\"open\":\"09:00\",\"close\":\"17:00\"}"));
        assert_eq!(hours["Saturday"], json!("{\"open\":\"closed\",\"close\":\"closed\"}"));
        assert_eq!(hours["Sunday"], json!("{\"open\":\"10:00\",\"close\":\"12:00\"}"));
        assert!(hours["Tuesday"].is_string());
        assert_eq!(settings.get().await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_validated_reports_fields() {
        let store = MemoryDocumentStore::new();
        let settings = SettingsStore::<OrganizationSettings>::new(&store);

        let err = settings
            .update_validated(object(json!({ "Name": "Central Library" })))
            .await
            .unwrap_err();
        match err {
            SettingsError::Validation(errors) => assert!(errors.errors().contains_key("contact")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.is_empty().await);

        let patch = OrganizationSettingsPatch {
            name: Some("Central Library".to_owned()),
            contact: Some(Contact {
                email: "desk@central.org".to_owned(),
                ..Contact::default()
            }),
            ..OrganizationSettingsPatch::default()
        };
        let updated = settings
            .update_validated(to_partial(&patch).unwrap())
            .await
            .unwrap();
        assert!(updated.is_configured());
    }
}
