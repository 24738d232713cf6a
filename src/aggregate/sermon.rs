//! Sermon Aggregate

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    DomainError, EngagementSet, EngagementStatistics, NestedCollection, OperationContext,
};

use super::{optional_text, required_text, text_matches, Aggregate, Comment, Discussable, Document};

/// Sermon with likes, favorites and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sermon {
    pub id: Uuid,
    #[serde(default)]
    pub version: i64,
    pub verse: String,
    pub preacher: String,
    pub description: String,
    pub posted_by: String,
    #[serde(default)]
    pub likes: EngagementSet,
    #[serde(default)]
    pub favorites: EngagementSet,
    #[serde(default)]
    pub comments: NestedCollection<Comment>,
    #[serde(default)]
    pub statistics: EngagementStatistics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sermon {
    pub fn new(
        verse: &str,
        preacher: &str,
        description: &str,
        context: &OperationContext,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: Uuid::new_v4(),
            version: 0,
            verse: required_text(verse, "verse")?,
            preacher: required_text(preacher, "preacher")?,
            description: required_text(description, "description")?,
            posted_by: context.actor_name().to_string(),
            likes: EngagementSet::new(),
            favorites: EngagementSet::new(),
            comments: NestedCollection::new(),
            statistics: EngagementStatistics::default(),
            created_at: now,
            updated_at: now,
        })
    }
}

impl Aggregate for Sermon {
    fn aggregate_type() -> &'static str {
        "Sermon"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn refresh_statistics(&mut self) -> Result<(), DomainError> {
        self.statistics = EngagementStatistics::recompute(&self.likes, &self.favorites, &self.comments)?;
        Ok(())
    }
}

impl Discussable for Sermon {
    fn likes_mut(&mut self) -> &mut EngagementSet {
        &mut self.likes
    }

    fn favorites_mut(&mut self) -> &mut EngagementSet {
        &mut self.favorites
    }

    fn comments(&self) -> &NestedCollection<Comment> {
        &self.comments
    }

    fn comments_mut(&mut self) -> &mut NestedCollection<Comment> {
        &mut self.comments
    }

    fn engagement(&self) -> &EngagementStatistics {
        &self.statistics
    }
}

/// Request to create a sermon
#[derive(Debug, Clone, Deserialize)]
pub struct SermonDraft {
    pub verse: String,
    pub preacher: String,
    pub description: String,
}

/// Partial sermon update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SermonPatch {
    pub verse: Option<String>,
    pub preacher: Option<String>,
    pub description: Option<String>,
}

/// Sermon listing query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SermonFilter {
    pub preacher: Option<String>,
    pub search: Option<String>,
}

impl Document for Sermon {
    type Draft = SermonDraft;
    type Patch = SermonPatch;
    type Filter = SermonFilter;
    type View = Sermon;

    fn from_draft(
        draft: SermonDraft,
        context: &OperationContext,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Sermon::new(&draft.verse, &draft.preacher, &draft.description, context, now)
    }

    fn apply_patch(
        &mut self,
        patch: &SermonPatch,
        _context: &OperationContext,
        _now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if let Some(verse) = &patch.verse {
            self.verse = required_text(verse, "verse")?;
        }
        if let Some(preacher) = &patch.preacher {
            self.preacher = required_text(preacher, "preacher")?;
        }
        if let Some(description) = &patch.description {
            self.description = required_text(description, "description")?;
        }
        Ok(())
    }

    fn matches(&self, filter: &SermonFilter, _now: DateTime<Utc>) -> bool {
        if let Some(preacher) = optional_text(filter.preacher.as_deref()) {
            if !self.preacher.eq_ignore_ascii_case(&preacher) {
                return false;
            }
        }
        match &filter.search {
            Some(search) => text_matches(
                search,
                [self.verse.as_str(), self.preacher.as_str(), self.description.as_str()],
            ),
            None => true,
        }
    }

    fn listing_order(&self, other: &Self) -> Ordering {
        other.created_at.cmp(&self.created_at)
    }

    fn into_view(self, _now: DateTime<Utc>) -> Sermon {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        let context = OperationContext::default();
        assert!(Sermon::new("", "Pastor", "text", &context, Utc::now()).is_err());
        assert!(Sermon::new("John 1:1", " ", "text", &context, Utc::now()).is_err());

        let sermon = Sermon::new("John 1:1", "Pastor", "In the beginning", &context, Utc::now()).unwrap();
        assert_eq!(sermon.posted_by, "Guest");
        assert_eq!(sermon.statistics, EngagementStatistics::default());
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let context = OperationContext::default();
        let mut sermon = Sermon::new("John 1:1", "Pastor", "In the beginning", &context, Utc::now()).unwrap();
        let patch = SermonPatch {
            preacher: Some("Elder Naomi".to_string()),
            ..Default::default()
        };

        sermon.apply_patch(&patch, &context, Utc::now()).unwrap();
        assert_eq!(sermon.preacher, "Elder Naomi");
        assert_eq!(sermon.verse, "John 1:1");
    }

    #[test]
    fn test_filter_by_preacher_and_search() {
        let context = OperationContext::default();
        let sermon = Sermon::new("John 1:1", "Pastor Ruth", "In the beginning", &context, Utc::now()).unwrap();
        let now = Utc::now();

        let by_preacher = SermonFilter {
            preacher: Some("pastor ruth".to_string()),
            search: None,
        };
        assert!(sermon.matches(&by_preacher, now));

        let search = SermonFilter {
            preacher: None,
            search: Some("BEGINNING".to_string()),
        };
        assert!(sermon.matches(&search, now));

        let miss = SermonFilter {
            preacher: None,
            search: Some("exodus".to_string()),
        };
        assert!(!sermon.matches(&miss, now));
    }
}
