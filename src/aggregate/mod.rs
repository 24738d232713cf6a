//! Aggregate module
//!
//! Aggregate roots persisted as single documents together with their nested
//! collections.

pub mod baptism;
pub mod discussion;
pub mod event;
pub mod preaching;
pub mod sermon;
pub mod study;
pub mod video;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::domain::{DomainError, OperationContext};

pub use baptism::{BaptismClass, Student, StudentStatus};
pub use discussion::{Comment, Discussable, Reply};
pub use event::Event;
pub use preaching::DailyPreaching;
pub use sermon::Sermon;
pub use study::Study;
pub use video::Video;

/// Aggregate trait that all stored aggregates implement
pub trait Aggregate: Serialize + DeserializeOwned + Send + Sync + Sized + 'static {
    /// Get the aggregate type name (for storage)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID
    fn id(&self) -> Uuid;

    /// Get the storage version this copy was loaded at
    fn version(&self) -> i64;

    fn set_version(&mut self, version: i64);

    /// Stamp the last-modified time
    fn touch(&mut self, at: DateTime<Utc>);

    /// Rebuild every derived counter from the nested collections.
    ///
    /// Called before each save; a failure aborts the save.
    fn refresh_statistics(&mut self) -> Result<(), DomainError>;

    /// Check scalar field constraints before a save
    fn validate(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Administrative surface of an aggregate: creation, patching, listing.
pub trait Document: Aggregate {
    /// Creation payload
    type Draft: DeserializeOwned + Send + 'static;

    /// Partial update payload
    type Patch: DeserializeOwned + Send + Sync + 'static;

    /// Listing query
    type Filter: DeserializeOwned + Default + Send + Sync + 'static;

    /// Single-document response
    type View: Serialize + Send + 'static;

    fn from_draft(
        draft: Self::Draft,
        context: &OperationContext,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError>;

    fn apply_patch(
        &mut self,
        patch: &Self::Patch,
        context: &OperationContext,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Whether the document belongs in a listing for `filter`
    fn matches(&self, filter: &Self::Filter, now: DateTime<Utc>) -> bool;

    /// Listing order
    fn listing_order(&self, other: &Self) -> Ordering;

    fn into_view(self, now: DateTime<Utc>) -> Self::View;

    /// Count a read; returns `true` when the document changed and must be saved
    fn record_view(&mut self) -> bool {
        false
    }

    /// Hidden documents are reported as not found
    fn is_visible(&self) -> bool {
        true
    }

    /// Soft delete in place; `false` means the document is removed from storage
    fn retire(&mut self) -> bool {
        false
    }
}

/// Case-insensitive substring match used by listing searches
pub(crate) fn text_matches<'a, I>(needle: &str, haystacks: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    haystacks
        .into_iter()
        .any(|haystack| haystack.to_lowercase().contains(&needle))
}

/// Trimmed, non-empty text or a validation error naming `field`
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trimmed text, `None` when blank
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Fail when `value` is longer than `max` characters
pub(crate) fn check_length(value: Option<&str>, field: &str, max: usize) -> Result<(), DomainError> {
    match value {
        Some(value) if value.chars().count() > max => Err(DomainError::validation(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}

/// First `keep` characters followed by `...` when `text` exceeds `max`
pub(crate) fn abbreviate(text: &str, max: usize, keep: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(keep).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_matches() {
        assert!(text_matches("GRACE", ["Amazing grace"]));
        assert!(!text_matches("psalm", ["Amazing grace", "hymn"]));
        assert!(text_matches("  ", ["anything"]));
    }

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("  Ruth ", "name").unwrap(), "Ruth");
        assert!(matches!(
            required_text("   ", "name"),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("short", 10, 7), "short");
        assert_eq!(abbreviate("abcdefghijkl", 10, 7), "abcdefg...");
    }

    #[test]
    fn test_check_length_counts_chars() {
        assert!(check_length(Some("ééé"), "title", 3).is_ok());
        assert!(check_length(Some("éééé"), "title", 3).is_err());
        assert!(check_length(None, "title", 3).is_ok());
    }
}
