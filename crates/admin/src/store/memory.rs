//! In-memory document store.
//!
//! Used by tests and by local development without a database. A batch is
//! applied under a single write lock, so readers never observe half of it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use libris_core::DocumentPath;

use super::{Document, DocumentStore, StoreError, WriteBatch};

/// A document store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<BTreeMap<DocumentPath, Document>>,
    unavailable: AtomicBool,
    reject_commits: AtomicBool,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while set, every operation fails with
    /// `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make batch commits fail while reads and single writes keep working.
    pub fn set_reject_commits(&self, reject: bool) {
        self.reject_commits.store(reject, Ordering::SeqCst);
    }

    /// Number of stored documents across all collections.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is marked unavailable".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.check_available()?;
        Ok(self.documents.read().await.get(path).cloned())
    }

    async fn set(&self, path: &DocumentPath, document: Document) -> Result<(), StoreError> {
        self.check_available()?;
        self.documents.write().await.insert(path.clone(), document);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        self.check_available()?;
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .filter(|(path, _)| path.collection() == collection)
            .map(|(path, document)| (path.id().to_owned(), document.clone()))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.check_available()?;
        if self.reject_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "batch of {} writes rejected",
                batch.len()
            )));
        }
        let writes = batch.into_stamped_writes(Utc::now());
        let mut documents = self.documents.write().await;
        for (path, document) in writes {
            documents.insert(path, document);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::to_document;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = MemoryDocumentStore::new();
        let found = store.get(&DocumentPath::new("system", "x")).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryDocumentStore::new();
        let path = DocumentPath::new("settings", "organization");
        store
            .set(&path, to_document(&json!({ "Name": "A", "Logo": "x" })).unwrap())
            .await
            .unwrap();
        store
            .set(&path, to_document(&json!({ "Name": "B" })).unwrap())
            .await
            .unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.get("Name").unwrap(), "B");
        assert!(doc.get("Logo").is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_collection() {
        let store = MemoryDocumentStore::new();
        let mut batch = WriteBatch::new();
        batch
            .set(DocumentPath::new("admins", "b@x.org"), &json!({ "n": 2 }))
            .unwrap()
            .set(DocumentPath::new("admins", "a@x.org"), &json!({ "n": 1 }))
            .unwrap()
            .set(DocumentPath::new("books", "_placeholder"), &json!({}))
            .unwrap();
        store.commit(batch).await.unwrap();

        let admins = store.list("admins").await.unwrap();
        let ids: Vec<&str> = admins.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["a@x.org", "b@x.org"]);
    }

    #[tokio::test]
    async fn test_failed_commit_writes_nothing() {
        let store = MemoryDocumentStore::new();
        store.set_unavailable(true);

        let mut batch = WriteBatch::new();
        batch
            .set(DocumentPath::new("system", "initialization"), &json!({ "initialized": true }))
            .unwrap();
        assert!(matches!(
            store.commit(batch).await,
            Err(StoreError::Unavailable(_))
        ));

        store.set_unavailable(false);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_rejected_commit_keeps_reads_working() {
        let store = MemoryDocumentStore::new();
        store.set_reject_commits(true);

        let mut batch = WriteBatch::new();
        batch.set(DocumentPath::new("books", "_placeholder"), &json!({})).unwrap();
        assert!(store.commit(batch).await.is_err());
        assert!(store.get(&DocumentPath::new("books", "_placeholder")).await.unwrap().is_none());
    }
}
