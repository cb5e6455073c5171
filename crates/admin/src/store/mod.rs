//! Document store abstraction.
//!
//! Libris keeps every record in a schemaless document store addressed by
//! `(collection, id)`. The store offers exactly four operations: get, set
//! (overwrite), list a collection, and commit an all-or-nothing batch.
//!
//! # Backends
//!
//! - [`PostgresDocumentStore`] - JSONB rows in `libris.document` (production)
//! - [`MemoryDocumentStore`] - in-process map (tests, local development)

pub mod memory;
pub mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PostgresDocumentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use libris_core::DocumentPath;

/// A stored document: always a JSON object.
pub type Document = Map<String, Value>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A value could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored document does not have the expected shape.
    #[error("data corruption in {path}: {reason}")]
    DataCorruption { path: String, reason: String },

    /// Constraint violation (e.g., duplicate admin email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// The document store contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document. A missing document is `Ok(None)`, never an error.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Create or overwrite a document.
    async fn set(&self, path: &DocumentPath, document: Document) -> Result<(), StoreError>;

    /// All documents of a collection as `(id, document)`, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError>;

    /// Apply every write in the batch, or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Backend name for logs and diagnostics.
    fn backend_name(&self) -> &'static str;
}

/// One write inside a [`WriteBatch`].
#[derive(Debug, Clone)]
pub struct BatchWrite {
    pub path: DocumentPath,
    pub document: Document,
    /// Top-level fields the store fills with its own clock at commit time.
    pub server_timestamps: Vec<&'static str>,
}

/// An ordered set of overwrites committed atomically.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<BatchWrite>,
}

impl WriteBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an overwrite of `path` with `value`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if `value` is not a JSON object.
    pub fn set<T: Serialize>(
        &mut self,
        path: DocumentPath,
        value: &T,
    ) -> Result<&mut Self, StoreError> {
        self.set_with_server_timestamps(path, value, &[])
    }

    /// Queue an overwrite whose `fields` are stamped by the store at commit.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if `value` is not a JSON object.
    pub fn set_with_server_timestamps<T: Serialize>(
        &mut self,
        path: DocumentPath,
        value: &T,
        fields: &[&'static str],
    ) -> Result<&mut Self, StoreError> {
        let document = to_document(value)?;
        self.writes.push(BatchWrite {
            path,
            document,
            server_timestamps: fields.to_vec(),
        });
        Ok(self)
    }

    /// Number of queued writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Queued writes in insertion order.
    #[must_use]
    pub fn writes(&self) -> &[BatchWrite] {
        &self.writes
    }

    /// Consume the batch, stamping server timestamps with `now`.
    #[must_use]
    pub fn into_stamped_writes(self, now: DateTime<Utc>) -> Vec<(DocumentPath, Document)> {
        let stamp = serde_json::to_value(now).unwrap_or(Value::Null);
        self.writes
            .into_iter()
            .map(|mut write| {
                for field in write.server_timestamps {
                    write.document.insert(field.to_owned(), stamp.clone());
                }
                (write.path, write.document)
            })
            .collect()
    }
}

/// Serialize a value into a [`Document`].
///
/// # Errors
///
/// Returns `StoreError::Serialization` if `value` is not a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(serde::ser::Error::custom(
            format!("documents must be JSON objects, got {other}"),
        ))),
    }
}

/// Fetch and deserialize a document.
///
/// # Errors
///
/// Returns the store's error, or `StoreError::DataCorruption` if the stored
/// document does not deserialize into `T`.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &DocumentPath,
) -> Result<Option<T>, StoreError> {
    store
        .get(path)
        .await?
        .map(|document| from_document(path, document))
        .transpose()
}

/// Serialize and overwrite a document.
///
/// # Errors
///
/// Returns the store's error or a serialization error.
pub async fn set_typed<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    path: &DocumentPath,
    value: &T,
) -> Result<(), StoreError> {
    store.set(path, to_document(value)?).await
}

/// Deserialize a stored document, attributing failures to its path.
///
/// # Errors
///
/// Returns `StoreError::DataCorruption` if the document has the wrong shape.
pub fn from_document<T: DeserializeOwned>(
    path: &DocumentPath,
    document: Document,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(document)).map_err(|e| StoreError::DataCorruption {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_batch_rejects_non_objects() {
        let mut batch = WriteBatch::new();
        let err = batch
            .set(DocumentPath::new("c", "d"), &"just a string")
            .unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_batch_stamps_server_timestamps() {
        let mut batch = WriteBatch::new();
        batch
            .set_with_server_timestamps(
                DocumentPath::new("admins", "a@b.com"),
                &json!({ "name": "A", "createdAt": null }),
                &["createdAt"],
            )
            .unwrap()
            .set(DocumentPath::new("books", "_placeholder"), &json!({ "placeholder": true }))
            .unwrap();
        assert_eq!(batch.len(), 2);

        let now = Utc::now();
        let writes = batch.into_stamped_writes(now);
        let (_, admin) = &writes[0];
        let stamped: DateTime<Utc> = serde_json::from_value(admin["createdAt"].clone()).unwrap();
        assert_eq!(stamped, now);
        assert!(writes[1].1.get("createdAt").is_none());
    }

    #[test]
    fn test_from_document_reports_path() {
        let path = DocumentPath::new("system", "initialization");
        let err = from_document::<libris_core::InitializationMarker>(&path, Document::new())
            .unwrap_err();
        match err {
            StoreError::DataCorruption { path, .. } => assert_eq!(path, "system/initialization"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
