//! Discussion Handler
//!
//! Likes, favorites, comments and replies for any [`Discussable`] document.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{Comment, Discussable, Reply};
use crate::domain::{EngagementStatistics, OperationContext, ToggleOutcome};
use crate::error::AppError;
use crate::store::{DocumentStore, Repository};

use super::{require_identity, PostCommentCommand};

/// A toggle outcome together with the refreshed statistics
#[derive(Debug, Clone, Serialize)]
pub struct EngagementResult {
    #[serde(flatten)]
    pub outcome: ToggleOutcome,
    pub statistics: EngagementStatistics,
}

/// Newly posted comment or reply
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Posted {
    Comment(Comment),
    Reply(Reply),
}

/// Handler for discussion threads on documents of kind `A`
pub struct DiscussionHandler<A> {
    repository: Repository<A>,
}

impl<A: Discussable> DiscussionHandler<A> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    pub async fn toggle_like(
        &self,
        document_id: Uuid,
        context: &OperationContext,
    ) -> Result<EngagementResult, AppError> {
        let identity = require_identity(context)?;
        let (document, outcome) = self
            .repository
            .mutate(document_id, |document| document.toggle_like(&identity.user_id))
            .await?;

        tracing::debug!(
            kind = A::aggregate_type(),
            id = %document_id,
            liked = outcome.new_state,
            "Like toggled"
        );
        Ok(EngagementResult {
            outcome,
            statistics: document.engagement().clone(),
        })
    }

    pub async fn toggle_favorite(
        &self,
        document_id: Uuid,
        context: &OperationContext,
    ) -> Result<EngagementResult, AppError> {
        let identity = require_identity(context)?;
        let (document, outcome) = self
            .repository
            .mutate(document_id, |document| {
                document.toggle_favorite(&identity.user_id)
            })
            .await?;

        Ok(EngagementResult {
            outcome,
            statistics: document.engagement().clone(),
        })
    }

    /// Post a comment, or a reply when the target names a comment
    pub async fn post(
        &self,
        command: PostCommentCommand,
        context: &OperationContext,
    ) -> Result<Posted, AppError> {
        let identity = require_identity(context)?;
        let target = command.target;

        let (_, posted) = self
            .repository
            .mutate(target.document_id, |document| {
                let now = Utc::now();
                match target.comment_id {
                    Some(comment_id) => document
                        .add_reply(comment_id, identity, &command.text, now)
                        .map(Posted::Reply),
                    None => document
                        .add_comment(identity, &command.text, now)
                        .map(Posted::Comment),
                }
            })
            .await?;

        tracing::info!(
            kind = A::aggregate_type(),
            id = %target.document_id,
            reply = target.comment_id.is_some(),
            author = %identity.user_id,
            "Comment posted"
        );
        Ok(posted)
    }

    pub async fn edit_comment(
        &self,
        document_id: Uuid,
        comment_id: Uuid,
        text: String,
        context: &OperationContext,
    ) -> Result<Comment, AppError> {
        let identity = require_identity(context)?;
        let (_, comment) = self
            .repository
            .mutate(document_id, |document| {
                document.ensure_open()?;
                document.edit_comment(comment_id, identity, &text, Utc::now())
            })
            .await?;
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        document_id: Uuid,
        comment_id: Uuid,
        context: &OperationContext,
    ) -> Result<EngagementStatistics, AppError> {
        let identity = require_identity(context)?;
        let (document, _) = self
            .repository
            .mutate(document_id, |document| {
                document.ensure_open()?;
                document.delete_comment(comment_id, identity)
            })
            .await?;

        tracing::info!(
            kind = A::aggregate_type(),
            id = %document_id,
            comment_id = %comment_id,
            "Comment deleted"
        );
        Ok(document.engagement().clone())
    }

    pub async fn toggle_comment_like(
        &self,
        document_id: Uuid,
        comment_id: Uuid,
        context: &OperationContext,
    ) -> Result<EngagementResult, AppError> {
        let identity = require_identity(context)?;
        let (document, outcome) = self
            .repository
            .mutate(document_id, |document| {
                document.toggle_comment_like(comment_id, &identity.user_id)
            })
            .await?;

        Ok(EngagementResult {
            outcome,
            statistics: document.engagement().clone(),
        })
    }

    pub async fn delete_reply(
        &self,
        document_id: Uuid,
        comment_id: Uuid,
        reply_id: Uuid,
        context: &OperationContext,
    ) -> Result<EngagementStatistics, AppError> {
        let identity = require_identity(context)?;
        let (document, _) = self
            .repository
            .mutate(document_id, |document| {
                document.ensure_open()?;
                document.delete_reply(comment_id, reply_id, identity)
            })
            .await?;
        Ok(document.engagement().clone())
    }
}
