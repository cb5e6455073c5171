//! `PostgreSQL` document store.
//!
//! Documents live as JSONB rows in `libris.document`, keyed by
//! `(collection, id)`. Batches run inside one transaction, and server
//! timestamps come from the transaction's `NOW()`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use libris_core::DocumentPath;

use super::{Document, DocumentStore, StoreError, WriteBatch};

const UPSERT_DOCUMENT: &str = r"
    INSERT INTO libris.document (collection, id, data)
    VALUES ($1, $2, $3)
    ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
";

/// Document store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool (shared with the session store).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_document(path: &DocumentPath, value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::DataCorruption {
            path: path.to_string(),
            reason: format!("expected a JSON object, found {other}"),
        }),
    }
}

async fn upsert(
    tx: &mut Transaction<'_, Postgres>,
    path: &DocumentPath,
    document: Document,
) -> Result<(), StoreError> {
    sqlx::query(UPSERT_DOCUMENT)
        .bind(path.collection())
        .bind(path.id())
        .bind(Json(Value::Object(document)))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self), fields(path = %path))]
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT data FROM libris.document
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(path.collection())
        .bind(path.id())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let Json(value): Json<Value> = row.try_get("data")?;
            into_document(path, value)
        })
        .transpose()
    }

    #[instrument(skip(self, document), fields(path = %path))]
    async fn set(&self, path: &DocumentPath, document: Document) -> Result<(), StoreError> {
        sqlx::query(UPSERT_DOCUMENT)
            .bind(path.collection())
            .bind(path.id())
            .bind(Json(Value::Object(document)))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT id, data FROM libris.document
            WHERE collection = $1
            ORDER BY id
            ",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                let Json(value): Json<Value> = row.try_get("data")?;
                let document = into_document(&DocumentPath::new(collection, id.as_str()), value)?;
                Ok((id, document))
            })
            .collect()
    }

    #[instrument(skip(self, batch), fields(writes = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let now: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
            .fetch_one(&mut *tx)
            .await?;

        for (path, document) in batch.into_stamped_writes(now) {
            upsert(&mut tx, &path, document).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
