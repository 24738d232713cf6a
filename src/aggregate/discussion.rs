//! Discussion threads
//!
//! Comments with one level of replies, plus the like/favorite sets shared by
//! studies, sermons, daily preachings and videos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    ChildRecord, DomainError, EngagementSet, EngagementStatistics, Identity, NestedCollection,
    Threaded, ToggleOutcome,
};

use super::{check_length, required_text, Aggregate};

/// Maximum comment or reply length in characters
pub const MAX_COMMENT_LENGTH: usize = 2000;

fn comment_text(text: &str) -> Result<String, DomainError> {
    let text = required_text(text, "comment text")?;
    check_length(Some(&text), "comment text", MAX_COMMENT_LENGTH)?;
    Ok(text)
}

// =========================================================================
// Child records
// =========================================================================

/// Reply to a comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChildRecord for Reply {
    const KIND: &'static str = "Reply";

    fn id(&self) -> Uuid {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

/// Top-level comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    #[serde(default)]
    pub likes: EngagementSet,
    #[serde(default)]
    pub replies: NestedCollection<Reply>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

impl Comment {
    fn new(author: &Identity, text: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::nil(),
            author_id: author.user_id.clone(),
            author_name: author.display_name.clone(),
            text,
            likes: EngagementSet::new(),
            replies: NestedCollection::new(),
            created_at: now,
            edited_at: None,
        }
    }
}

impl ChildRecord for Comment {
    const KIND: &'static str = "Comment";

    fn id(&self) -> Uuid {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

impl Threaded for Comment {
    fn reply_count(&self) -> usize {
        self.replies.len()
    }

    fn like_count(&self) -> usize {
        self.likes.len()
    }
}

// =========================================================================
// Discussable aggregates
// =========================================================================

/// Aggregate carrying likes, favorites and a comment thread.
///
/// The provided methods mutate in memory only; the repository recomputes the
/// engagement statistics on save.
pub trait Discussable: Aggregate {
    fn likes_mut(&mut self) -> &mut EngagementSet;

    fn favorites_mut(&mut self) -> &mut EngagementSet;

    fn comments(&self) -> &NestedCollection<Comment>;

    fn comments_mut(&mut self) -> &mut NestedCollection<Comment>;

    /// Statistics as of the last save
    fn engagement(&self) -> &EngagementStatistics;

    /// Whether the aggregate currently accepts engagement
    fn ensure_open(&self) -> Result<(), DomainError> {
        Ok(())
    }

    fn toggle_like(&mut self, user_id: &str) -> Result<ToggleOutcome, DomainError> {
        self.ensure_open()?;
        Ok(self.likes_mut().toggle(user_id))
    }

    fn toggle_favorite(&mut self, user_id: &str) -> Result<ToggleOutcome, DomainError> {
        self.ensure_open()?;
        Ok(self.favorites_mut().toggle(user_id))
    }

    fn add_comment(
        &mut self,
        author: &Identity,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment, DomainError> {
        self.ensure_open()?;
        let comment = Comment::new(author, comment_text(text)?, now);
        Ok(self.comments_mut().insert(comment).clone())
    }

    fn edit_comment(
        &mut self,
        comment_id: Uuid,
        editor: &Identity,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment, DomainError> {
        let text = comment_text(text)?;
        self.comments_mut().update_by_id(comment_id, |comment| {
            editor.ensure_can_modify(&comment.author_id)?;
            comment.text = text;
            comment.edited_at = Some(now);
            Ok(comment.clone())
        })
    }

    fn delete_comment(&mut self, comment_id: Uuid, caller: &Identity) -> Result<Comment, DomainError> {
        let comment = self.comments().find(comment_id)?;
        caller.ensure_can_modify(&comment.author_id)?;
        self.comments_mut().remove_by_id(comment_id)
    }

    fn toggle_comment_like(
        &mut self,
        comment_id: Uuid,
        user_id: &str,
    ) -> Result<ToggleOutcome, DomainError> {
        self.ensure_open()?;
        self.comments_mut()
            .update_by_id(comment_id, |comment| Ok(comment.likes.toggle(user_id)))
    }

    fn add_reply(
        &mut self,
        comment_id: Uuid,
        author: &Identity,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Reply, DomainError> {
        self.ensure_open()?;
        let reply = Reply {
            id: Uuid::nil(),
            author_id: author.user_id.clone(),
            author_name: author.display_name.clone(),
            text: comment_text(text)?,
            created_at: now,
        };
        self.comments_mut().update_by_id(comment_id, |comment| {
            Ok(comment.replies.insert(reply).clone())
        })
    }

    fn delete_reply(
        &mut self,
        comment_id: Uuid,
        reply_id: Uuid,
        caller: &Identity,
    ) -> Result<Reply, DomainError> {
        self.comments_mut().update_by_id(comment_id, |comment| {
            let reply = comment.replies.find(reply_id)?;
            caller.ensure_can_modify(&reply.author_id)?;
            comment.replies.remove_by_id(reply_id)
        })
    }
}
