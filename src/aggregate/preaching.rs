//! Daily Preaching Aggregate

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    DomainError, EngagementSet, EngagementStatistics, NestedCollection, OperationContext,
};

use super::{optional_text, required_text, text_matches, Aggregate, Comment, Discussable, Document};

/// Short daily message with its verse list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPreaching {
    pub id: Uuid,
    #[serde(default)]
    pub version: i64,
    pub day: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub preacher: String,
    #[serde(default)]
    pub verses: Vec<String>,
    pub description: String,
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

fn clean_verses(verses: &[String]) -> Vec<String> {
    verses
        .iter()
        .filter_map(|verse| optional_text(Some(verse)))
        .collect()
}

impl Aggregate for DailyPreaching {
    fn aggregate_type() -> &'static str {
        "DailyPreaching"
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

impl Discussable for DailyPreaching {
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

#[derive(Debug, Clone, Deserialize)]
pub struct PreachingDraft {
    pub day: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub preacher: String,
    #[serde(default)]
    pub verses: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreachingPatch {
    pub day: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub preacher: Option<String>,
    pub verses: Option<Vec<String>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreachingFilter {
    pub search: Option<String>,
}

impl Document for DailyPreaching {
    type Draft = PreachingDraft;
    type Patch = PreachingPatch;
    type Filter = PreachingFilter;
    type View = DailyPreaching;

    fn from_draft(
        draft: PreachingDraft,
        _context: &OperationContext,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: Uuid::new_v4(),
            version: 0,
            day: optional_text(draft.day.as_deref()),
            date: draft.date,
            preacher: required_text(&draft.preacher, "preacher")?,
            verses: clean_verses(&draft.verses),
            description: required_text(&draft.description, "description")?,
            likes: EngagementSet::new(),
            favorites: EngagementSet::new(),
            comments: NestedCollection::new(),
            statistics: EngagementStatistics::default(),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(
        &mut self,
        patch: &PreachingPatch,
        _context: &OperationContext,
        _now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if let Some(day) = &patch.day {
            self.day = optional_text(Some(day));
        }
        if let Some(date) = patch.date {
            self.date = Some(date);
        }
        if let Some(preacher) = &patch.preacher {
            self.preacher = required_text(preacher, "preacher")?;
        }
        if let Some(verses) = &patch.verses {
            self.verses = clean_verses(verses);
        }
        if let Some(description) = &patch.description {
            self.description = required_text(description, "description")?;
        }
        Ok(())
    }

    fn matches(&self, filter: &PreachingFilter, _now: DateTime<Utc>) -> bool {
        match &filter.search {
            Some(search) => text_matches(
                search,
                [self.preacher.as_str(), self.description.as_str()]
                    .into_iter()
                    .chain(self.verses.iter().map(String::as_str)),
            ),
            None => true,
        }
    }

    /// Most recent date first; undated entries last
    fn listing_order(&self, other: &Self) -> Ordering {
        match (self.date, other.date) {
            (Some(left), Some(right)) => right.cmp(&left),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => other.created_at.cmp(&self.created_at),
        }
    }

    fn into_view(self, _now: DateTime<Utc>) -> DailyPreaching {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(date: Option<DateTime<Utc>>) -> PreachingDraft {
        PreachingDraft {
            day: Some("Monday".to_string()),
            date,
            preacher: "Pastor Ruth".to_string(),
            verses: vec!["Psalm 1:1".to_string(), "  ".to_string()],
            description: "Blessed is the one".to_string(),
        }
    }

    #[test]
    fn test_blank_verses_dropped() {
        let preaching =
            DailyPreaching::from_draft(draft(None), &OperationContext::default(), Utc::now()).unwrap();
        assert_eq!(preaching.verses, vec!["Psalm 1:1".to_string()]);
    }

    #[test]
    fn test_listing_order_newest_date_first() {
        let now = Utc::now();
        let context = OperationContext::default();
        let older = DailyPreaching::from_draft(draft(Some(now - Duration::days(2))), &context, now).unwrap();
        let newer = DailyPreaching::from_draft(draft(Some(now)), &context, now).unwrap();
        let undated = DailyPreaching::from_draft(draft(None), &context, now).unwrap();

        let mut all = vec![older.clone(), undated.clone(), newer.clone()];
        all.sort_by(|a, b| a.listing_order(b));
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);
        assert_eq!(all[2].id, undated.id);
    }

    #[test]
    fn test_search_covers_verses() {
        let preaching =
            DailyPreaching::from_draft(draft(None), &OperationContext::default(), Utc::now()).unwrap();
        let filter = PreachingFilter {
            search: Some("psalm".to_string()),
        };
        assert!(preaching.matches(&filter, Utc::now()));
    }
}
