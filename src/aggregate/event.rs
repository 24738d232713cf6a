//! Event Aggregate
//!
//! Church events with an optional attendee capacity. Registration is keyed by
//! user id; the attendance statistics block is rebuilt on every save.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    check_admission, AttendanceStatistics, Capacity, ChildRecord, DomainError, Enrollable, Identity,
    NestedCollection, OperationContext,
};

use super::{
    abbreviate, check_length, optional_text, required_text, text_matches, Aggregate, Document,
};

const MAX_TITLE: usize = 100;
const MAX_DESCRIPTION: usize = 1000;
const MAX_SHORT_DESCRIPTION: usize = 200;
const SHORT_DESCRIPTION_KEEP: usize = 197;
const DEFAULT_IMAGE_URL: &str = "/default-event.jpg";
const MILLIS_PER_DAY: f64 = 86_400_000.0;

// =========================================================================
// Enumerations
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Worship,
    BibleStudy,
    Prayer,
    Fellowship,
    Outreach,
    #[default]
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Worship => "worship",
            EventCategory::BibleStudy => "bible_study",
            EventCategory::Prayer => "prayer",
            EventCategory::Fellowship => "fellowship",
            EventCategory::Outreach => "outreach",
            EventCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    #[default]
    Published,
    Cancelled,
}

/// Time-relative label shown with a single event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTiming {
    Past,
    Tomorrow,
    ThisWeek,
    Upcoming,
}

// =========================================================================
// Child records
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

/// Registered attendee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: Uuid,
    pub user_id: String,
    pub user_name: String,
    pub email: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl ChildRecord for Attendee {
    const KIND: &'static str = "Attendee";

    fn id(&self) -> Uuid {
        self.id
    }

    fn assign_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

impl Enrollable for Attendee {
    fn enrollment_key(&self) -> Option<&str> {
        Some(&self.user_id)
    }
}

// =========================================================================
// Aggregate
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    #[serde(default)]
    pub version: i64,
    pub title: String,
    pub verse: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub address: Option<Address>,
    pub virtual_link: Option<String>,
    pub category: EventCategory,
    pub image_url: String,
    /// Zero or unset means unlimited
    pub capacity: Option<u32>,
    #[serde(default)]
    pub attendees: NestedCollection<Attendee>,
    pub posted_by: String,
    pub is_featured: bool,
    pub status: EventStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub statistics: AttendanceStatistics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub id: Uuid,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventMeta {
    pub event_status: EventTiming,
    pub days_until: i64,
    pub attendees_count: u32,
    pub available_spots: Option<u32>,
}

/// Add `tags` not already present, keeping existing order
fn merge_tags(existing: &mut Vec<String>, tags: impl IntoIterator<Item = String>) {
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !existing.iter().any(|known| known == tag) {
            existing.push(tag.to_string());
        }
    }
}

impl Event {
    pub fn capacity(&self) -> Capacity {
        Capacity::from_limit(self.capacity)
    }

    /// Register the caller; fails when full, already registered, or cancelled
    pub fn register(
        &mut self,
        identity: &Identity,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Registration, DomainError> {
        if self.status == EventStatus::Cancelled {
            return Err(DomainError::validation("event has been cancelled"));
        }

        let candidate = Attendee {
            id: Uuid::nil(),
            user_id: identity.user_id.clone(),
            user_name: identity.display_name.clone(),
            email: optional_text(email),
            registered_at: now,
        };
        check_admission(self.capacity(), &self.attendees, &candidate)?;

        let attendee = self.attendees.insert(candidate);
        Ok(Registration {
            id: attendee.id,
            registered_at: attendee.registered_at,
        })
    }

    /// Remove the registration held by `user_id`
    pub fn cancel_registration(&mut self, user_id: &str) -> Result<(), DomainError> {
        match self.attendees.remove_where(|attendee| attendee.user_id == user_id) {
            0 => Err(DomainError::not_found("Registration", user_id)),
            _ => Ok(()),
        }
    }

    pub fn is_registered(&self, user_id: &str) -> bool {
        self.attendees.iter().any(|attendee| attendee.user_id == user_id)
    }

    pub fn toggle_featured(&mut self) -> bool {
        self.is_featured = !self.is_featured;
        self.is_featured
    }

    pub fn add_tags(&mut self, tags: Vec<String>) -> &[String] {
        merge_tags(&mut self.tags, tags);
        &self.tags
    }

    /// Whole days until the event, rounded up
    pub fn days_until(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.date - now).num_milliseconds() as f64;
        (millis / MILLIS_PER_DAY).ceil() as i64
    }

    pub fn timing(&self, now: DateTime<Utc>) -> EventTiming {
        if self.date < now {
            return EventTiming::Past;
        }
        match self.days_until(now) {
            days if days <= 1 => EventTiming::Tomorrow,
            days if days <= 7 => EventTiming::ThisWeek,
            _ => EventTiming::Upcoming,
        }
    }

    pub fn meta(&self, now: DateTime<Utc>) -> EventMeta {
        EventMeta {
            event_status: self.timing(now),
            days_until: self.days_until(now),
            attendees_count: self.statistics.attendees_count,
            available_spots: self.statistics.available_spots,
        }
    }

    fn set_description(&mut self, description: Option<&str>, short: Option<&str>) {
        self.description = optional_text(description);
        self.short_description = optional_text(short).or_else(|| {
            self.description
                .as_deref()
                .map(|text| abbreviate(text, MAX_SHORT_DESCRIPTION, SHORT_DESCRIPTION_KEEP))
        });
    }

    fn set_category(&mut self, category: EventCategory) {
        self.category = category;
        let mut tags = vec![category.as_str().to_string()];
        merge_tags(&mut tags, std::mem::take(&mut self.tags));
        self.tags = tags;
    }
}

impl Aggregate for Event {
    fn aggregate_type() -> &'static str {
        "Event"
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
        self.statistics = AttendanceStatistics::recompute(&self.attendees, self.capacity())?;
        Ok(())
    }

    fn validate(&self) -> Result<(), DomainError> {
        check_length(Some(&self.title), "title", MAX_TITLE)?;
        check_length(self.description.as_deref(), "description", MAX_DESCRIPTION)?;
        check_length(
            self.short_description.as_deref(),
            "short_description",
            MAX_SHORT_DESCRIPTION,
        )?;
        if let Some(end) = self.end_date {
            if end < self.date {
                return Err(DomainError::validation("end_date must not precede date"));
            }
        }
        Ok(())
    }
}

// =========================================================================
// Administrative surface
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub verse: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub address: Option<Address>,
    pub virtual_link: Option<String>,
    #[serde(default)]
    pub category: EventCategory,
    pub image_url: Option<String>,
    pub capacity: Option<u32>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub title: Option<String>,
    pub verse: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub address: Option<Address>,
    pub virtual_link: Option<String>,
    pub category: Option<EventCategory>,
    pub image_url: Option<String>,
    pub capacity: Option<u32>,
    pub is_featured: Option<bool>,
    pub status: Option<EventStatus>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum When {
    Upcoming,
    Past,
}

/// Event listing query; drafts are never listed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    /// Category name or `all`
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub when: Option<When>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub event: Event,
    pub meta: EventMeta,
}

impl Document for Event {
    type Draft = EventDraft;
    type Patch = EventPatch;
    type Filter = EventFilter;
    type View = EventView;

    fn from_draft(
        draft: EventDraft,
        context: &OperationContext,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let mut event = Self {
            id: Uuid::new_v4(),
            version: 0,
            title: required_text(&draft.title, "title")?,
            verse: optional_text(draft.verse.as_deref()),
            description: None,
            short_description: None,
            date: draft.date,
            end_date: draft.end_date,
            location: optional_text(draft.location.as_deref()),
            address: draft.address,
            virtual_link: optional_text(draft.virtual_link.as_deref()),
            category: draft.category,
            image_url: optional_text(draft.image_url.as_deref())
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            capacity: draft.capacity,
            attendees: NestedCollection::new(),
            posted_by: context.actor_name().to_string(),
            is_featured: draft.is_featured,
            status: draft.status,
            tags: Vec::new(),
            statistics: AttendanceStatistics::default(),
            created_at: now,
            updated_at: now,
        };
        event.set_description(draft.description.as_deref(), draft.short_description.as_deref());
        merge_tags(&mut event.tags, draft.tags);
        event.set_category(draft.category);
        event.validate()?;
        Ok(event)
    }

    fn apply_patch(
        &mut self,
        patch: &EventPatch,
        _context: &OperationContext,
        _now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if let Some(title) = &patch.title {
            self.title = required_text(title, "title")?;
        }
        if let Some(verse) = &patch.verse {
            self.verse = optional_text(Some(verse));
        }
        match (&patch.description, &patch.short_description) {
            (Some(description), short) => self.set_description(Some(description), short.as_deref()),
            (None, Some(short)) => self.short_description = optional_text(Some(short)),
            (None, None) => {}
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = Some(end_date);
        }
        if let Some(location) = &patch.location {
            self.location = optional_text(Some(location));
        }
        if let Some(address) = &patch.address {
            self.address = Some(address.clone());
        }
        if let Some(link) = &patch.virtual_link {
            self.virtual_link = optional_text(Some(link));
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = optional_text(Some(image_url))
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string());
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = Some(capacity);
        }
        if let Some(featured) = patch.is_featured {
            self.is_featured = featured;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(tags) = &patch.tags {
            self.tags.clear();
            merge_tags(&mut self.tags, tags.iter().cloned());
            self.set_category(self.category);
        }
        if let Some(category) = patch.category {
            self.set_category(category);
        }
        Ok(())
    }

    fn matches(&self, filter: &EventFilter, now: DateTime<Utc>) -> bool {
        if self.status == EventStatus::Draft {
            return false;
        }
        if let Some(category) = filter.category.as_deref().map(str::trim) {
            if !category.is_empty() && category != "all" && category != self.category.as_str() {
                return false;
            }
        }
        if filter.featured == Some(true) && !self.is_featured {
            return false;
        }
        match filter.when {
            Some(When::Upcoming) if self.date < now => return false,
            Some(When::Past) if self.date >= now => return false,
            _ => {}
        }
        if filter.from_date.is_some_and(|from| self.date < from)
            || filter.to_date.is_some_and(|to| self.date > to)
        {
            return false;
        }
        match &filter.search {
            Some(search) => text_matches(
                search,
                [self.title.as_str()]
                    .into_iter()
                    .chain(self.description.as_deref())
                    .chain(self.verse.as_deref())
                    .chain(self.location.as_deref())
                    .chain(self.tags.iter().map(String::as_str)),
            ),
            None => true,
        }
    }

    /// Soonest first
    fn listing_order(&self, other: &Self) -> Ordering {
        self.date.cmp(&other.date)
    }

    fn into_view(self, now: DateTime<Utc>) -> EventView {
        EventView {
            meta: self.meta(now),
            event: self,
        }
    }
}

// =========================================================================
// Reports
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCategoryCount {
    pub category: EventCategory,
    pub count: u64,
    pub total_attendees: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub total_events: u64,
    pub upcoming_events: u64,
    pub past_events: u64,
    pub total_attendees: u64,
    pub featured_events: u64,
    pub categories: Vec<EventCategoryCount>,
}

impl EventSummary {
    /// Upcoming, past, attendee and category figures cover published events only
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>, now: DateTime<Utc>) -> Self {
        let mut summary = Self {
            total_events: 0,
            upcoming_events: 0,
            past_events: 0,
            total_attendees: 0,
            featured_events: 0,
            categories: Vec::new(),
        };
        let mut by_category: HashMap<EventCategory, (u64, u64)> = HashMap::new();

        for event in events {
            summary.total_events += 1;
            summary.featured_events += u64::from(event.is_featured);
            if event.status != EventStatus::Published {
                continue;
            }

            let attendees = u64::from(event.statistics.attendees_count);
            if event.date >= now {
                summary.upcoming_events += 1;
            } else {
                summary.past_events += 1;
            }
            summary.total_attendees += attendees;
            let entry = by_category.entry(event.category).or_default();
            entry.0 += 1;
            entry.1 += attendees;
        }

        summary.categories = by_category
            .into_iter()
            .map(|(category, (count, total_attendees))| EventCategoryCount {
                category,
                count,
                total_attendees,
            })
            .collect();
        summary.categories.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.category.as_str().cmp(b.category.as_str()))
        });
        summary
    }
}

/// Published events starting within the next 24 hours, soonest first
pub fn upcoming_within_a_day(events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
    let horizon = now + Duration::hours(24);
    let mut upcoming: Vec<Event> = events
        .into_iter()
        .filter(|event| {
            event.status == EventStatus::Published && event.date >= now && event.date <= horizon
        })
        .collect();
    upcoming.sort_by(|a, b| a.listing_order(b));
    upcoming
}
