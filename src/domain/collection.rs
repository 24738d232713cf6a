//! Nested Collections
//!
//! Ordered child records embedded inside an aggregate. Children are addressed
//! by id through index lookup on the owned vector; insertion order is stable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DomainError;

/// A record stored inside a parent aggregate's nested collection
pub trait ChildRecord {
    /// Label used in `NotFound` errors ("Attendee", "Comment", ...)
    const KIND: &'static str;

    fn id(&self) -> Uuid;

    /// Called once at insertion time
    fn assign_id(&mut self, id: Uuid);
}

/// Ordered collection of child records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NestedCollection<T> {
    items: Vec<T>,
}

impl<T> Default for NestedCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: ChildRecord> NestedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under a freshly assigned id and return it
    pub fn insert(&mut self, mut item: T) -> &T {
        let mut id = Uuid::new_v4();
        while self.position(id).is_some() {
            id = Uuid::new_v4();
        }
        item.assign_id(id);
        self.items.push(item);
        let last = self.items.len() - 1;
        &self.items[last]
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.position(id).map(|index| &self.items[index])
    }

    /// Look up a record, failing with `NotFound`
    pub fn find(&self, id: Uuid) -> Result<&T, DomainError> {
        self.get(id).ok_or_else(|| DomainError::not_found(T::KIND, id))
    }

    /// Mutate a record in place.
    ///
    /// The closure's error aborts the update; whatever it already changed stays
    /// on the in-memory aggregate, so callers discard the aggregate on error.
    pub fn update_by_id<R, F>(&mut self, id: Uuid, update: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut T) -> Result<R, DomainError>,
    {
        let index = self
            .position(id)
            .ok_or_else(|| DomainError::not_found(T::KIND, id))?;
        update(&mut self.items[index])
    }

    /// Remove a record, returning it
    pub fn remove_by_id(&mut self, id: Uuid) -> Result<T, DomainError> {
        let index = self
            .position(id)
            .ok_or_else(|| DomainError::not_found(T::KIND, id))?;
        Ok(self.items.remove(index))
    }

    /// Remove every record matching the predicate, returning how many went
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.items.len();
        self.items.retain(|item| !predicate(item));
        before - self.items.len()
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}

impl<T> NestedCollection<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }
}

impl<'a, T> IntoIterator for &'a NestedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: Uuid,
        text: String,
        children: NestedCollection<Note>,
    }

    impl Note {
        fn new(text: &str) -> Self {
            Self {
                id: Uuid::nil(),
                text: text.to_string(),
                children: NestedCollection::new(),
            }
        }
    }

    impl ChildRecord for Note {
        const KIND: &'static str = "Note";

        fn id(&self) -> Uuid {
            self.id
        }

        fn assign_id(&mut self, id: Uuid) {
            self.id = id;
        }
    }

    #[test]
    fn test_insert_assigns_fresh_ids_in_order() {
        let mut notes = NestedCollection::new();
        let first = notes.insert(Note::new("a")).id();
        let second = notes.insert(Note::new("b")).id();

        assert_ne!(first, Uuid::nil());
        assert_ne!(first, second);
        let texts: Vec<_> = notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_update_by_id() {
        let mut notes = NestedCollection::new();
        let id = notes.insert(Note::new("a")).id();

        let text = notes
            .update_by_id(id, |note| {
                note.text = "edited".to_string();
                Ok(note.text.clone())
            })
            .unwrap();

        assert_eq!(text, "edited");
        assert_eq!(notes.find(id).unwrap().text, "edited");
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let mut notes: NestedCollection<Note> = NestedCollection::new();
        let missing = Uuid::new_v4();

        assert!(matches!(
            notes.update_by_id(missing, |_| Ok(())),
            Err(DomainError::NotFound { kind: "Note", .. })
        ));
        assert!(matches!(
            notes.remove_by_id(missing),
            Err(DomainError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_keeps_order_of_remaining() {
        let mut notes = NestedCollection::new();
        notes.insert(Note::new("a"));
        let middle = notes.insert(Note::new("b")).id();
        notes.insert(Note::new("c"));

        let removed = notes.remove_by_id(middle).unwrap();
        assert_eq!(removed.text, "b");
        let texts: Vec<_> = notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn test_two_level_mutation() {
        let mut notes = NestedCollection::new();
        let parent = notes.insert(Note::new("parent")).id();

        let child = notes
            .update_by_id(parent, |note| Ok(note.children.insert(Note::new("child")).id()))
            .unwrap();
        assert_eq!(notes.find(parent).unwrap().children.len(), 1);

        let removed = notes
            .update_by_id(parent, |note| note.children.remove_by_id(child))
            .unwrap();
        assert_eq!(removed.text, "child");
        assert!(notes.find(parent).unwrap().children.is_empty());
    }

    #[test]
    fn test_remove_where() {
        let mut notes = NestedCollection::new();
        notes.insert(Note::new("a"));
        notes.insert(Note::new("b"));
        notes.insert(Note::new("a"));

        assert_eq!(notes.remove_where(|n| n.text == "a"), 2);
        assert_eq!(notes.len(), 1);
    }
}
