//! Document Store Errors
//!
//! Error types for document store operations.

use uuid::Uuid;

/// Errors that can occur in the document store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic concurrency conflict
    #[error("Concurrency conflict for {kind} {id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        kind: String,
        id: Uuid,
        expected: i64,
        actual: i64,
    },

    /// Document not found
    #[error("Document not found: {kind} {id}")]
    DocumentNotFound { kind: String, id: Uuid },

    /// A document with this id already exists
    #[error("Document already exists: {kind} {id}")]
    DuplicateDocument { kind: String, id: Uuid },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Maximum retries exceeded
    #[error("Maximum retries exceeded for {kind} {id}")]
    MaxRetriesExceeded { kind: String, id: Uuid },
}

impl StoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::ConcurrencyConflict { .. } | StoreError::Database(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_retryable() {
        let conflict = StoreError::ConcurrencyConflict {
            kind: "Event".to_string(),
            id: Uuid::new_v4(),
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_retryable());
        assert!(conflict.is_concurrency_conflict());

        let not_found = StoreError::DocumentNotFound {
            kind: "Event".to_string(),
            id: Uuid::new_v4(),
        };
        assert!(!not_found.is_retryable());
    }
}
