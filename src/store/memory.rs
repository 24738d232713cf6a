//! In-memory document store
//!
//! Used by tests and by `STORE_BACKEND=memory` for local development.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError, StoredDocument};

#[derive(Debug)]
struct Entry {
    sequence: u64,
    document: StoredDocument,
}

#[derive(Debug, Default)]
struct Documents {
    next_sequence: u64,
    entries: HashMap<(String, Uuid), Entry>,
}

/// Document store backed by a process-local map
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<Documents>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn load(&self, kind: &str, id: Uuid) -> Result<Option<StoredDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .entries
            .get(&(kind.to_string(), id))
            .map(|entry| entry.document.clone()))
    }

    async fn list(&self, kind: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let documents = self.documents.read().await;
        let mut entries: Vec<&Entry> = documents
            .entries
            .iter()
            .filter(|((entry_kind, _), _)| entry_kind == kind)
            .map(|(_, entry)| entry)
            .collect();
        entries.sort_by_key(|entry| entry.sequence);

        Ok(entries.into_iter().map(|entry| entry.document.clone()).collect())
    }

    async fn insert(
        &self,
        kind: &str,
        id: Uuid,
        body: serde_json::Value,
    ) -> Result<StoredDocument, StoreError> {
        let mut documents = self.documents.write().await;
        let key = (kind.to_string(), id);
        if documents.entries.contains_key(&key) {
            return Err(StoreError::DuplicateDocument {
                kind: kind.to_string(),
                id,
            });
        }

        let now = Utc::now();
        let document = StoredDocument {
            kind: kind.to_string(),
            id,
            version: 1,
            body,
            created_at: now,
            updated_at: now,
        };
        let sequence = documents.next_sequence;
        documents.next_sequence += 1;
        documents.entries.insert(
            key,
            Entry {
                sequence,
                document: document.clone(),
            },
        );

        Ok(document)
    }

    async fn save(
        &self,
        kind: &str,
        id: Uuid,
        expected_version: i64,
        body: serde_json::Value,
    ) -> Result<StoredDocument, StoreError> {
        let mut documents = self.documents.write().await;
        let entry = documents
            .entries
            .get_mut(&(kind.to_string(), id))
            .ok_or_else(|| StoreError::DocumentNotFound {
                kind: kind.to_string(),
                id,
            })?;

        if entry.document.version != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                kind: kind.to_string(),
                id,
                expected: expected_version,
                actual: entry.document.version,
            });
        }

        entry.document.version += 1;
        entry.document.body = body;
        entry.document.updated_at = Utc::now();

        Ok(entry.document.clone())
    }

    async fn delete(&self, kind: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().await;
        Ok(documents.entries.remove(&(kind.to_string(), id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_then_load() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::new_v4();

        let stored = store.insert("Event", id, json!({"title": "Vigil"})).await.unwrap();
        assert_eq!(stored.version, 1);

        let loaded = store.load("Event", id).await.unwrap().unwrap();
        assert_eq!(loaded.body["title"], "Vigil");
        assert!(store.load("Sermon", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::new_v4();
        store.insert("Event", id, json!({})).await.unwrap();

        let result = store.insert("Event", id, json!({})).await;
        assert!(matches!(result, Err(StoreError::DuplicateDocument { .. })));
    }

    #[tokio::test]
    async fn test_save_checks_version() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::new_v4();
        store.insert("Event", id, json!({"n": 1})).await.unwrap();

        let saved = store.save("Event", id, 1, json!({"n": 2})).await.unwrap();
        assert_eq!(saved.version, 2);

        let stale = store.save("Event", id, 1, json!({"n": 3})).await;
        assert!(matches!(
            stale,
            Err(StoreError::ConcurrencyConflict {
                expected: 1,
                actual: 2,
                ..
            })
        ));
        assert_eq!(store.load("Event", id).await.unwrap().unwrap().body["n"], 2);
    }

    #[tokio::test]
    async fn test_save_missing_document() {
        let store = InMemoryDocumentStore::new();
        let result = store.save("Event", Uuid::new_v4(), 1, json!({})).await;
        assert!(matches!(result, Err(StoreError::DocumentNotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_in_insertion_order_per_kind() {
        let store = InMemoryDocumentStore::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        store.insert("Study", first, json!({})).await.unwrap();
        store.insert("Sermon", Uuid::new_v4(), json!({})).await.unwrap();
        store.insert("Study", second, json!({})).await.unwrap();

        let ids: Vec<Uuid> = store
            .list("Study")
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::new_v4();
        store.insert("Event", id, json!({})).await.unwrap();

        assert!(store.delete("Event", id).await.unwrap());
        assert!(!store.delete("Event", id).await.unwrap());
    }
}
