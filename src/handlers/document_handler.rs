//! Document Handler
//!
//! Administrative create, read, list, update and delete for any
//! [`Document`] aggregate. Writes require the admin role.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Document;
use crate::domain::{DomainError, OperationContext};
use crate::error::AppError;
use crate::store::{DocumentStore, Repository};

use super::require_admin;

/// Pagination query
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// One page of a listing
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<V> {
    pub items: Vec<V>,
    pub total: usize,
    pub has_more: bool,
}

fn ensure_visible<A: Document>(document: &A) -> Result<(), DomainError> {
    if document.is_visible() {
        Ok(())
    } else {
        Err(DomainError::not_found(A::aggregate_type(), document.id()))
    }
}

/// Handler for administrative document operations
pub struct DocumentHandler<A> {
    repository: Repository<A>,
}

impl<A: Document> DocumentHandler<A> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    pub async fn create(&self, draft: A::Draft, context: &OperationContext) -> Result<A::View, AppError> {
        require_admin(context)?;
        let now = Utc::now();
        let document = A::from_draft(draft, context, now)?;
        let created = self.repository.create(document).await?;

        tracing::info!(
            kind = A::aggregate_type(),
            id = %created.id(),
            actor = context.actor_name(),
            "Document created"
        );
        Ok(created.into_view(now))
    }

    /// Read one document, counting the view where the document tracks views
    pub async fn get(&self, id: Uuid) -> Result<A::View, AppError> {
        let mut document = self.repository.load(id).await?;
        ensure_visible(&document)?;

        if document.record_view() {
            let (saved, _) = self
                .repository
                .mutate(id, |document| {
                    ensure_visible(document)?;
                    document.record_view();
                    Ok(())
                })
                .await?;
            document = saved;
        }

        Ok(document.into_view(Utc::now()))
    }

    pub async fn list(&self, filter: &A::Filter, page: Page) -> Result<ListResult<A::View>, AppError> {
        let now = Utc::now();
        let mut documents: Vec<A> = self
            .repository
            .list()
            .await?
            .into_iter()
            .filter(|document| document.is_visible() && document.matches(filter, now))
            .collect();
        documents.sort_by(|a, b| a.listing_order(b));

        let total = documents.len();
        let items: Vec<A::View> = documents
            .into_iter()
            .skip(page.offset)
            .take(page.limit.unwrap_or(usize::MAX))
            .map(|document| document.into_view(now))
            .collect();
        let has_more = page.offset + items.len() < total;

        Ok(ListResult {
            items,
            total,
            has_more,
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: A::Patch,
        context: &OperationContext,
    ) -> Result<A::View, AppError> {
        require_admin(context)?;
        let (saved, _) = self
            .repository
            .mutate(id, |document| {
                ensure_visible(document)?;
                document.apply_patch(&patch, context, Utc::now())
            })
            .await?;

        tracing::info!(kind = A::aggregate_type(), id = %id, "Document updated");
        Ok(saved.into_view(Utc::now()))
    }

    /// Delete a document; soft-deleting kinds are retired in place instead
    pub async fn delete(&self, id: Uuid, context: &OperationContext) -> Result<(), AppError> {
        require_admin(context)?;
        let document = self.repository.load(id).await?;
        ensure_visible(&document)?;

        let mut probe = document;
        if probe.retire() {
            self.repository
                .mutate(id, |document| {
                    ensure_visible(document)?;
                    document.retire();
                    Ok(())
                })
                .await?;
        } else {
            self.repository.delete(id).await?;
        }

        tracing::info!(kind = A::aggregate_type(), id = %id, "Document deleted");
        Ok(())
    }
}
