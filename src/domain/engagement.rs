//! Engagement sets
//!
//! Likes and favorites are sets of user identifiers. Toggling is the only
//! transition: present ids are removed, absent ids are added.

use serde::{Deserialize, Serialize};

/// Result of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    /// Whether the user is a member after the toggle
    pub new_state: bool,
    pub collection_size: usize,
}

/// Insertion-ordered set of user identifiers.
///
/// Equality ignores order: two sets are equal when they hold the same ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct EngagementSet(Vec<String>);

impl From<Vec<String>> for EngagementSet {
    fn from(ids: Vec<String>) -> Self {
        ids.into_iter().collect()
    }
}

impl PartialEq for EngagementSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }
}

impl Eq for EngagementSet {}

impl EngagementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, user_id: &str) -> ToggleOutcome {
        let new_state = match self.0.iter().position(|id| id == user_id) {
            Some(index) => {
                self.0.remove(index);
                false
            }
            None => {
                self.0.push(user_id.to_string());
                true
            }
        };

        ToggleOutcome {
            new_state,
            collection_size: self.0.len(),
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.0.iter().any(|id| id == user_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for EngagementSet {
    /// Builds a set, keeping the first occurrence of repeated ids
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = EngagementSet::new();
        for id in iter {
            let id = id.into();
            if !set.contains(&id) {
                set.0.push(id);
            }
        }
        set
    }
}
