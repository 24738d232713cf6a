//! Bible Study Aggregate
//!
//! Studies carry a full discussion thread plus view and share counters. Only
//! published studies are listed.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    DomainError, EngagementSet, EngagementStatistics, NestedCollection, OperationContext,
};

use super::{
    abbreviate, check_length, optional_text, required_text, text_matches, Aggregate, Comment,
    Discussable, Document,
};

const MAX_TITLE: usize = 200;
const MAX_CALL_TO_ACTION: usize = 100;
const MAX_DESCRIPTION: usize = 5000;
const MAX_SUMMARY: usize = 500;
const SUMMARY_KEEP: usize = 150;
const MAX_ESTIMATED_MINUTES: u32 = 480;
const DERIVED_TAG_COUNT: usize = 5;
const COMMON_WORDS: [&str; 10] = [
    "the", "and", "for", "you", "that", "this", "with", "are", "from", "have",
];

// =========================================================================
// Enumerations
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StudyCategory {
    OldTestament,
    NewTestament,
    Gospels,
    Prophets,
    Wisdom,
    Epistles,
    Apocalyptic,
    #[default]
    Topical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StudyStatus {
    Draft,
    #[default]
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BibleVersion {
    #[default]
    #[serde(rename = "NIV")]
    Niv,
    #[serde(rename = "KJV")]
    Kjv,
    #[serde(rename = "ESV")]
    Esv,
    #[serde(rename = "NASB")]
    Nasb,
    #[serde(rename = "NLT")]
    Nlt,
    #[serde(rename = "MSG")]
    Msg,
    #[serde(rename = "AMP")]
    Amp,
}

/// Scripture passage quoted by a study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    pub reference: String,
    pub text: String,
    #[serde(default)]
    pub version: BibleVersion,
    pub notes: Option<String>,
}

// =========================================================================
// Aggregate
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: Uuid,
    #[serde(default)]
    pub version: i64,
    pub title: String,
    pub call_to_action: Option<String>,
    pub description: String,
    pub summary: String,
    pub category: StudyCategory,
    pub subcategory: Option<String>,
    pub difficulty: Difficulty,
    pub estimated_time: Option<u32>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub verses: Vec<Verse>,
    #[serde(default)]
    pub discussion_questions: Vec<String>,
    #[serde(default)]
    pub key_takeaways: Vec<String>,
    #[serde(default)]
    pub prayer_points: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub share_count: u64,
    pub is_featured: bool,
    pub status: StudyStatus,
    pub posted_by: String,
    pub last_updated_by: Option<String>,
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

/// Up to five most frequent words longer than three letters, most frequent
/// first, ties in order of first appearance
pub fn derive_tags(title: &str, description: &str) -> Vec<String> {
    let text = format!("{} {}", title, description).to_lowercase();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for word in text.split(|c: char| !c.is_alphanumeric() && c != '_') {
        if word.chars().count() <= 3 || COMMON_WORDS.contains(&word) {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| seen == word) {
            Some((_, count)) => *count += 1,
            None => counts.push((word.to_string(), 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(DERIVED_TAG_COUNT)
        .map(|(word, _)| word)
        .collect()
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| optional_text(Some(item)))
        .collect()
}

impl Study {
    /// Record a share; returns the new share count
    pub fn share(&mut self) -> u64 {
        self.share_count += 1;
        self.share_count
    }

    /// Reading-length label derived from `estimated_time`
    pub fn time_to_complete(&self) -> &'static str {
        match self.estimated_time {
            Some(minutes) if minutes < 30 => "Short (< 30 min)",
            Some(minutes) if minutes < 60 => "Medium (30-60 min)",
            Some(_) => "Long (> 60 min)",
            None => "Not specified",
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == StudyStatus::Published
    }

    fn set_description(&mut self, description: &str, summary: Option<&str>) -> Result<(), DomainError> {
        self.description = required_text(description, "description")?;
        self.summary = match optional_text(summary) {
            Some(summary) => summary,
            None => abbreviate(&self.description, SUMMARY_KEEP, SUMMARY_KEEP),
        };
        Ok(())
    }
}

impl Aggregate for Study {
    fn aggregate_type() -> &'static str {
        "Study"
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

    fn validate(&self) -> Result<(), DomainError> {
        check_length(Some(&self.title), "title", MAX_TITLE)?;
        check_length(self.call_to_action.as_deref(), "call_to_action", MAX_CALL_TO_ACTION)?;
        check_length(Some(&self.description), "description", MAX_DESCRIPTION)?;
        check_length(Some(&self.summary), "summary", MAX_SUMMARY)?;
        if let Some(minutes) = self.estimated_time {
            if !(1..=MAX_ESTIMATED_MINUTES).contains(&minutes) {
                return Err(DomainError::validation(format!(
                    "estimated_time must be between 1 and {} minutes",
                    MAX_ESTIMATED_MINUTES
                )));
            }
        }
        Ok(())
    }
}

impl Discussable for Study {
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

// =========================================================================
// Administrative surface
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct StudyDraft {
    pub title: String,
    pub call_to_action: Option<String>,
    pub description: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub category: StudyCategory,
    pub subcategory: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub estimated_time: Option<u32>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub verses: Vec<Verse>,
    #[serde(default)]
    pub discussion_questions: Vec<String>,
    #[serde(default)]
    pub key_takeaways: Vec<String>,
    #[serde(default)]
    pub prayer_points: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub status: StudyStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyPatch {
    pub title: Option<String>,
    pub call_to_action: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub category: Option<StudyCategory>,
    pub subcategory: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub estimated_time: Option<u32>,
    pub image_url: Option<String>,
    pub verses: Option<Vec<Verse>>,
    pub discussion_questions: Option<Vec<String>>,
    pub key_takeaways: Option<Vec<String>>,
    pub prayer_points: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub status: Option<StudyStatus>,
}

/// Study listing query; `all` disables a category or difficulty filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyFilter {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub featured: Option<bool>,
    /// Comma-separated; a study matches when it carries any of them
    pub tags: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyMeta {
    pub comments_count: u32,
    pub total_likes: u32,
    pub time_to_complete: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyView {
    pub study: Study,
    pub meta: StudyMeta,
}

fn enum_matches<T: Serialize>(wanted: Option<&str>, value: &T) -> bool {
    match wanted.map(str::trim) {
        None | Some("") | Some("all") => true,
        Some(wanted) => serde_json::to_value(value)
            .ok()
            .and_then(|value| value.as_str().map(|actual| actual == wanted))
            .unwrap_or(false),
    }
}

impl Document for Study {
    type Draft = StudyDraft;
    type Patch = StudyPatch;
    type Filter = StudyFilter;
    type View = StudyView;

    fn from_draft(
        draft: StudyDraft,
        context: &OperationContext,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let title = required_text(&draft.title, "title")?;
        let mut tags = clean_list(&draft.tags);
        if tags.is_empty() {
            tags = derive_tags(&title, &draft.description);
        }

        let mut study = Self {
            id: Uuid::new_v4(),
            version: 0,
            title,
            call_to_action: optional_text(draft.call_to_action.as_deref()),
            description: String::new(),
            summary: String::new(),
            category: draft.category,
            subcategory: optional_text(draft.subcategory.as_deref()),
            difficulty: draft.difficulty,
            estimated_time: draft.estimated_time,
            image_url: optional_text(draft.image_url.as_deref()),
            verses: draft.verses,
            discussion_questions: clean_list(&draft.discussion_questions),
            key_takeaways: clean_list(&draft.key_takeaways),
            prayer_points: clean_list(&draft.prayer_points),
            tags,
            views: 0,
            share_count: 0,
            is_featured: draft.is_featured,
            status: draft.status,
            posted_by: context.actor_name().to_string(),
            last_updated_by: None,
            likes: EngagementSet::new(),
            favorites: EngagementSet::new(),
            comments: NestedCollection::new(),
            statistics: EngagementStatistics::default(),
            created_at: now,
            updated_at: now,
        };
        study.set_description(&draft.description, draft.summary.as_deref())?;
        study.validate()?;
        Ok(study)
    }

    fn apply_patch(
        &mut self,
        patch: &StudyPatch,
        context: &OperationContext,
        _now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if let Some(title) = &patch.title {
            self.title = required_text(title, "title")?;
        }
        if let Some(call_to_action) = &patch.call_to_action {
            self.call_to_action = optional_text(Some(call_to_action));
        }
        match (&patch.description, &patch.summary) {
            (Some(description), summary) => self.set_description(description, summary.as_deref())?,
            (None, Some(summary)) => {
                self.summary = optional_text(Some(summary))
                    .unwrap_or_else(|| abbreviate(&self.description, SUMMARY_KEEP, SUMMARY_KEEP));
            }
            (None, None) => {}
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(subcategory) = &patch.subcategory {
            self.subcategory = optional_text(Some(subcategory));
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(minutes) = patch.estimated_time {
            self.estimated_time = Some(minutes);
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = optional_text(Some(image_url));
        }
        if let Some(verses) = &patch.verses {
            self.verses = verses.clone();
        }
        if let Some(questions) = &patch.discussion_questions {
            self.discussion_questions = clean_list(questions);
        }
        if let Some(takeaways) = &patch.key_takeaways {
            self.key_takeaways = clean_list(takeaways);
        }
        if let Some(points) = &patch.prayer_points {
            self.prayer_points = clean_list(points);
        }
        if let Some(tags) = &patch.tags {
            self.tags = clean_list(tags);
        }
        if let Some(featured) = patch.is_featured {
            self.is_featured = featured;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.last_updated_by = Some(context.actor_name().to_string());
        Ok(())
    }

    fn matches(&self, filter: &StudyFilter, _now: DateTime<Utc>) -> bool {
        if !self.is_published() {
            return false;
        }
        if !enum_matches(filter.category.as_deref(), &self.category)
            || !enum_matches(filter.difficulty.as_deref(), &self.difficulty)
        {
            return false;
        }
        if filter.featured == Some(true) && !self.is_featured {
            return false;
        }
        if let Some(tags) = &filter.tags {
            let wanted: Vec<&str> = tags.split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
            if !wanted.is_empty() && !self.tags.iter().any(|tag| wanted.contains(&tag.as_str())) {
                return false;
            }
        }
        match &filter.search {
            Some(search) => text_matches(
                search,
                [self.title.as_str(), self.description.as_str()]
                    .into_iter()
                    .chain(self.call_to_action.as_deref())
                    .chain(self.tags.iter().map(String::as_str))
                    .chain(
                        self.verses
                            .iter()
                            .flat_map(|verse| [verse.reference.as_str(), verse.text.as_str()]),
                    ),
            ),
            None => true,
        }
    }

    fn listing_order(&self, other: &Self) -> Ordering {
        other.created_at.cmp(&self.created_at)
    }

    fn into_view(self, _now: DateTime<Utc>) -> StudyView {
        let meta = StudyMeta {
            comments_count: self.statistics.comments_count,
            total_likes: self.statistics.total_likes,
            time_to_complete: self.time_to_complete(),
        };
        StudyView { study: self, meta }
    }

    fn record_view(&mut self) -> bool {
        self.views += 1;
        true
    }
}

// =========================================================================
// Reports
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: StudyCategory,
    pub count: u64,
    pub average_views: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub name: String,
    pub count: u64,
    /// Up to three study titles carrying the tag
    pub studies: Vec<String>,
}

/// Totals over published studies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudySummary {
    pub total_studies: u64,
    pub total_comments: u64,
    pub total_likes: u64,
    pub featured_studies: u64,
    pub categories: Vec<CategoryCount>,
}

impl StudySummary {
    pub fn from_studies<'a>(studies: impl IntoIterator<Item = &'a Study>) -> Self {
        let mut summary = Self {
            total_studies: 0,
            total_comments: 0,
            total_likes: 0,
            featured_studies: 0,
            categories: Vec::new(),
        };
        let mut by_category: HashMap<StudyCategory, (u64, u64)> = HashMap::new();

        for study in studies.into_iter().filter(|study| study.is_published()) {
            summary.total_studies += 1;
            summary.total_comments += u64::from(study.statistics.comments_count);
            summary.total_likes += u64::from(study.statistics.likes_count);
            summary.featured_studies += u64::from(study.is_featured);
            let entry = by_category.entry(study.category).or_default();
            entry.0 += 1;
            entry.1 += study.views;
        }

        summary.categories = by_category
            .into_iter()
            .map(|(category, (count, views))| CategoryCount {
                category,
                count,
                average_views: views as f64 / count as f64,
            })
            .collect();
        summary
            .categories
            .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.average_views.total_cmp(&b.average_views).reverse()));
        summary
    }
}

/// Most used tags over published studies, at most `limit`
pub fn popular_tags<'a>(studies: impl IntoIterator<Item = &'a Study>, limit: usize) -> Vec<TagCount> {
    let mut tags: Vec<TagCount> = Vec::new();
    for study in studies.into_iter().filter(|study| study.is_published()) {
        for tag in &study.tags {
            match tags.iter_mut().find(|entry| &entry.name == tag) {
                Some(entry) => {
                    entry.count += 1;
                    if entry.studies.len() < 3 {
                        entry.studies.push(study.title.clone());
                    }
                }
                None => tags.push(TagCount {
                    name: tag.clone(),
                    count: 1,
                    studies: vec![study.title.clone()],
                }),
            }
        }
    }
    tags.sort_by(|a, b| b.count.cmp(&a.count));
    tags.truncate(limit);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> StudyDraft {
        StudyDraft {
            title: "Walking in grace".to_string(),
            call_to_action: None,
            description: "Grace upon grace: a study of grace in the gospels.".to_string(),
            summary: None,
            category: StudyCategory::Gospels,
            subcategory: None,
            difficulty: Difficulty::Beginner,
            estimated_time: Some(45),
            image_url: None,
            verses: vec![Verse {
                reference: "John 1:16".to_string(),
                text: "From his fullness we have all received".to_string(),
                version: BibleVersion::Esv,
                notes: None,
            }],
            discussion_questions: vec![],
            key_takeaways: vec![],
            prayer_points: vec![],
            tags: vec![],
            is_featured: false,
            status: StudyStatus::Published,
        }
    }

    fn study() -> Study {
        Study::from_draft(draft(), &OperationContext::default(), Utc::now()).unwrap()
    }

    #[test]
    fn test_summary_derived_from_description() {
        let mut draft = draft();
        draft.description = "x".repeat(300);
        let study = Study::from_draft(draft, &OperationContext::default(), Utc::now()).unwrap();
        assert_eq!(study.summary.chars().count(), 153);
        assert!(study.summary.ends_with("..."));

        let short = self::study();
        assert_eq!(short.summary, short.description);
    }

    #[test]
    fn test_tags_derived_when_missing() {
        let study = study();
        assert_eq!(study.tags[0], "grace");
        assert!(study.tags.len() <= DERIVED_TAG_COUNT);
        assert!(!study.tags.iter().any(|tag| tag == "the"));
    }

    #[test]
    fn test_explicit_tags_kept() {
        let mut draft = draft();
        draft.tags = vec!["hope".to_string(), " ".to_string()];
        let study = Study::from_draft(draft, &OperationContext::default(), Utc::now()).unwrap();
        assert_eq!(study.tags, vec!["hope".to_string()]);
    }

    #[test]
    fn test_estimated_time_bounds() {
        let mut draft = draft();
        draft.estimated_time = Some(0);
        assert!(Study::from_draft(draft.clone(), &OperationContext::default(), Utc::now()).is_err());
        draft.estimated_time = Some(481);
        assert!(Study::from_draft(draft, &OperationContext::default(), Utc::now()).is_err());
    }

    #[test]
    fn test_time_to_complete_labels() {
        let mut study = study();
        assert_eq!(study.time_to_complete(), "Medium (30-60 min)");
        study.estimated_time = Some(10);
        assert_eq!(study.time_to_complete(), "Short (< 30 min)");
        study.estimated_time = Some(90);
        assert_eq!(study.time_to_complete(), "Long (> 60 min)");
        study.estimated_time = None;
        assert_eq!(study.time_to_complete(), "Not specified");
    }

    #[test]
    fn test_view_and_share_counters() {
        let mut study = study();
        assert!(study.record_view());
        assert!(study.record_view());
        assert_eq!(study.views, 2);
        assert_eq!(study.share(), 1);
    }

    #[test]
    fn test_filter_rules() {
        let study = study();
        let now = Utc::now();

        let all = StudyFilter {
            category: Some("all".to_string()),
            ..Default::default()
        };
        assert!(study.matches(&all, now));

        let other_category = StudyFilter {
            category: Some("prophets".to_string()),
            ..Default::default()
        };
        assert!(!study.matches(&other_category, now));

        let by_difficulty = StudyFilter {
            difficulty: Some("beginner".to_string()),
            ..Default::default()
        };
        assert!(study.matches(&by_difficulty, now));

        let verse_search = StudyFilter {
            search: Some("john 1:16".to_string()),
            ..Default::default()
        };
        assert!(study.matches(&verse_search, now));

        let mut draft = study.clone();
        draft.status = StudyStatus::Draft;
        assert!(!draft.matches(&StudyFilter::default(), now));
    }

    #[test]
    fn test_patch_records_editor() {
        let mut study = study();
        let context = OperationContext::default();
        let patch = StudyPatch {
            description: Some("A shorter text".to_string()),
            ..Default::default()
        };
        study.apply_patch(&patch, &context, Utc::now()).unwrap();
        assert_eq!(study.summary, "A shorter text");
        assert_eq!(study.last_updated_by.as_deref(), Some("Guest"));
    }

    #[test]
    fn test_summary_and_popular_tags() {
        let mut first = study();
        first.is_featured = true;
        first.views = 10;
        let mut second = study();
        second.category = StudyCategory::Wisdom;
        second.tags = vec!["grace".to_string(), "proverbs".to_string()];
        let mut hidden = study();
        hidden.status = StudyStatus::Archived;

        let summary = StudySummary::from_studies([&first, &second, &hidden]);
        assert_eq!(summary.total_studies, 2);
        assert_eq!(summary.featured_studies, 1);
        assert_eq!(summary.categories.len(), 2);

        let tags = popular_tags([&first, &second, &hidden], 20);
        assert_eq!(tags[0].name, "grace");
        assert_eq!(tags[0].count, 2);
    }
}
