//! PostgreSQL document store
//!
//! Documents live in a single `documents` table keyed by `(kind, id)` with the
//! aggregate body in a JSONB column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{DocumentStore, StoreError, StoredDocument};

type DocumentRow = (
    String,
    Uuid,
    i64,
    serde_json::Value,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn into_document(
    (kind, id, version, body, created_at, updated_at): DocumentRow,
) -> StoredDocument {
    StoredDocument {
        kind,
        id,
        version,
        body,
        created_at,
        updated_at,
    }
}

/// Document store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new store with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current version of a document, if it exists
    async fn current_version(&self, kind: &str, id: Uuid) -> Result<Option<i64>, StoreError> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE kind = $1 AND id = $2")
                .bind(kind)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(version)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn load(&self, kind: &str, id: Uuid) -> Result<Option<StoredDocument>, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            SELECT kind, id, version, body, created_at, updated_at
            FROM documents
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(kind)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_document))
    }

    async fn list(&self, kind: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT kind, id, version, body, created_at, updated_at
            FROM documents
            WHERE kind = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(into_document).collect())
    }

    async fn insert(
        &self,
        kind: &str,
        id: Uuid,
        body: serde_json::Value,
    ) -> Result<StoredDocument, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            INSERT INTO documents (kind, id, version, body)
            VALUES ($1, $2, 1, $3)
            ON CONFLICT (kind, id) DO NOTHING
            RETURNING kind, id, version, body, created_at, updated_at
            "#,
        )
        .bind(kind)
        .bind(id)
        .bind(&body)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_document)
            .ok_or_else(|| StoreError::DuplicateDocument {
                kind: kind.to_string(),
                id,
            })
    }

    async fn save(
        &self,
        kind: &str,
        id: Uuid,
        expected_version: i64,
        body: serde_json::Value,
    ) -> Result<StoredDocument, StoreError> {
        let row: Option<DocumentRow> = sqlx::query_as(
            r#"
            UPDATE documents
            SET body = $4, version = version + 1, updated_at = NOW()
            WHERE kind = $1 AND id = $2 AND version = $3
            RETURNING kind, id, version, body, created_at, updated_at
            "#,
        )
        .bind(kind)
        .bind(id)
        .bind(expected_version)
        .bind(&body)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(into_document(row));
        }

        // Nothing updated: either the document is gone or someone saved first
        match self.current_version(kind, id).await? {
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                kind: kind.to_string(),
                id,
                expected: expected_version,
                actual,
            }),
            None => Err(StoreError::DocumentNotFound {
                kind: kind.to_string(),
                id,
            }),
        }
    }

    async fn delete(&self, kind: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE kind = $1 AND id = $2")
            .bind(kind)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
