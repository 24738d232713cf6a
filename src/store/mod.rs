//! Document Store module
//!
//! Persistence layer for aggregates. Each aggregate is stored as one JSON
//! document together with its nested collections, guarded by a version
//! number for optimistic concurrency.

mod error;
mod memory;
mod postgres;
mod repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use error::StoreError;
pub use memory::InMemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use repository::Repository;

/// Stored document as persisted
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub kind: String,
    pub id: Uuid,
    pub version: i64,
    pub body: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence collaborator for aggregate documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load one document, `None` when absent
    async fn load(&self, kind: &str, id: Uuid) -> Result<Option<StoredDocument>, StoreError>;

    /// All documents of a kind, oldest first
    async fn list(&self, kind: &str) -> Result<Vec<StoredDocument>, StoreError>;

    /// Insert a new document at version 1
    async fn insert(
        &self,
        kind: &str,
        id: Uuid,
        body: serde_json::Value,
    ) -> Result<StoredDocument, StoreError>;

    /// Replace a document if its stored version still equals `expected_version`
    async fn save(
        &self,
        kind: &str,
        id: Uuid,
        expected_version: i64,
        body: serde_json::Value,
    ) -> Result<StoredDocument, StoreError>;

    /// Delete a document; `false` when it did not exist
    async fn delete(&self, kind: &str, id: Uuid) -> Result<bool, StoreError>;
}
