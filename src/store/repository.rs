//! Aggregate Repository
//!
//! Typed access to one aggregate kind over a [`DocumentStore`]. Every save
//! refreshes derived statistics first and is checked against the version the
//! aggregate was loaded at.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::domain::DomainError;
use crate::error::AppError;

use super::{DocumentStore, StoreError, StoredDocument};

const MAX_RETRIES: u32 = 3;

/// Repository for a single aggregate kind
pub struct Repository<A> {
    store: Arc<dyn DocumentStore>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> Clone for Repository<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _aggregate: PhantomData,
        }
    }
}

impl<A: Aggregate> Repository<A> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _aggregate: PhantomData,
        }
    }

    fn decode(document: StoredDocument) -> Result<A, AppError> {
        let mut aggregate: A = serde_json::from_value(document.body).map_err(StoreError::from)?;
        aggregate.set_version(document.version);
        Ok(aggregate)
    }

    /// Load an aggregate, `None` when absent
    pub async fn find(&self, id: Uuid) -> Result<Option<A>, AppError> {
        match self.store.load(A::aggregate_type(), id).await? {
            Some(document) => Ok(Some(Self::decode(document)?)),
            None => Ok(None),
        }
    }

    /// Load an aggregate or fail with `NotFound`
    pub async fn load(&self, id: Uuid) -> Result<A, AppError> {
        self.find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(A::aggregate_type(), id).into())
    }

    /// All aggregates of this kind, oldest first
    pub async fn list(&self) -> Result<Vec<A>, AppError> {
        self.store
            .list(A::aggregate_type())
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    /// Persist a new aggregate
    pub async fn create(&self, mut aggregate: A) -> Result<A, AppError> {
        aggregate.refresh_statistics()?;
        aggregate.validate()?;

        let body = serde_json::to_value(&aggregate).map_err(StoreError::from)?;
        let stored = self
            .store
            .insert(A::aggregate_type(), aggregate.id(), body)
            .await?;
        aggregate.set_version(stored.version);

        tracing::debug!(
            kind = A::aggregate_type(),
            id = %aggregate.id(),
            "Document created"
        );
        Ok(aggregate)
    }

    /// Persist changes to an aggregate loaded from this repository
    pub async fn save(&self, mut aggregate: A) -> Result<A, AppError> {
        aggregate.refresh_statistics()?;
        aggregate.validate()?;
        aggregate.touch(Utc::now());

        let body = serde_json::to_value(&aggregate).map_err(StoreError::from)?;
        let stored = self
            .store
            .save(A::aggregate_type(), aggregate.id(), aggregate.version(), body)
            .await?;
        aggregate.set_version(stored.version);
        Ok(aggregate)
    }

    /// Delete an aggregate or fail with `NotFound`
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.store.delete(A::aggregate_type(), id).await? {
            tracing::debug!(kind = A::aggregate_type(), id = %id, "Document deleted");
            Ok(())
        } else {
            Err(DomainError::not_found(A::aggregate_type(), id).into())
        }
    }

    // =========================================================================
    // Load-mutate-save with retry
    // =========================================================================

    /// Load, apply `mutation`, and save.
    ///
    /// A version conflict reloads the aggregate and reapplies the mutation.
    /// A mutation error aborts without touching storage.
    pub async fn mutate<T, F>(&self, id: Uuid, mutation: F) -> Result<(A, T), AppError>
    where
        T: Send,
        F: Fn(&mut A) -> Result<T, DomainError> + Send + Sync,
    {
        for attempt in 0..MAX_RETRIES {
            let mut aggregate = self.load(id).await?;
            let outcome = mutation(&mut aggregate)?;

            match self.save(aggregate).await {
                Ok(saved) => return Ok((saved, outcome)),
                Err(AppError::Store(error))
                    if error.is_concurrency_conflict() && attempt < MAX_RETRIES - 1 =>
                {
                    let delay = Duration::from_millis(50 * (attempt as u64 + 1));
                    tokio::time::sleep(delay).await;
                    tracing::warn!(
                        kind = A::aggregate_type(),
                        id = %id,
                        "Concurrency conflict, retrying (attempt {}/{})",
                        attempt + 1,
                        MAX_RETRIES
                    );
                }
                Err(AppError::Store(error)) if error.is_concurrency_conflict() => break,
                Err(error) => return Err(error),
            }
        }

        Err(StoreError::MaxRetriesExceeded {
            kind: A::aggregate_type().to_string(),
            id,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Sermon;
    use crate::domain::{EngagementSet, OperationContext};
    use crate::store::InMemoryDocumentStore;

    fn repository() -> Repository<Sermon> {
        Repository::new(Arc::new(InMemoryDocumentStore::new()))
    }

    fn sermon() -> Sermon {
        Sermon::new(
            "John 3:16",
            "Pastor Ruth",
            "For God so loved the world",
            &OperationContext::default(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_load() {
        let repository = repository();
        let created = repository.create(sermon()).await.unwrap();
        assert_eq!(created.version(), 1);

        let loaded = repository.load(created.id()).await.unwrap();
        assert_eq!(loaded.verse, "John 3:16");
        assert_eq!(loaded.version(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let result = repository().load(Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_mutate_refreshes_statistics() {
        let repository = repository();
        let created = repository.create(sermon()).await.unwrap();

        let (saved, outcome) = repository
            .mutate(created.id(), |sermon| Ok(sermon.likes.toggle("u1")))
            .await
            .unwrap();

        assert!(outcome.new_state);
        assert_eq!(saved.statistics.likes_count, 1);
        assert_eq!(saved.version(), 2);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_document_untouched() {
        let repository = repository();
        let created = repository.create(sermon()).await.unwrap();

        let result: Result<(Sermon, ()), _> = repository
            .mutate(created.id(), |sermon| {
                sermon.likes = EngagementSet::from(vec!["u1".to_string()]);
                Err(DomainError::validation("rejected"))
            })
            .await;
        assert!(result.is_err());

        let loaded = repository.load(created.id()).await.unwrap();
        assert!(loaded.likes.is_empty());
        assert_eq!(loaded.version(), 1);
    }

    #[tokio::test]
    async fn test_stale_save_conflicts() {
        let repository = repository();
        let created = repository.create(sermon()).await.unwrap();

        let first = repository.load(created.id()).await.unwrap();
        let second = repository.load(created.id()).await.unwrap();
        repository.save(first).await.unwrap();

        let result = repository.save(second).await;
        assert!(matches!(
            result,
            Err(AppError::Store(StoreError::ConcurrencyConflict { .. }))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_toggles_are_not_lost() {
        let repository = repository();
        let id = repository.create(sermon()).await.unwrap().id();

        let left = repository.clone();
        let right = repository.clone();
        let (a, b) = tokio::join!(
            left.mutate(id, |sermon| Ok(sermon.likes.toggle("u1"))),
            right.mutate(id, |sermon| Ok(sermon.likes.toggle("u2"))),
        );
        a.unwrap();
        b.unwrap();

        let loaded = repository.load(id).await.unwrap();
        assert_eq!(loaded.statistics.likes_count, 2);
        assert_eq!(loaded.version(), 3);
    }

    #[tokio::test]
    async fn test_delete() {
        let repository = repository();
        let id = repository.create(sermon()).await.unwrap().id();

        repository.delete(id).await.unwrap();
        assert!(repository.find(id).await.unwrap().is_none());
        assert!(repository.delete(id).await.is_err());
    }
}
