//! Enrollment rules
//!
//! Capacity and duplicate-membership checks performed before a member is
//! inserted into a nested membership collection. The checks never mutate.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::{DomainError, NestedCollection};

/// A member of a capacity-bound collection (attendee, student)
pub trait Enrollable {
    /// External key used for duplicate detection; `None` disables the check
    fn enrollment_key(&self) -> Option<&str>;

    /// Whether the member occupies a seat and appears in statistics
    fn is_active(&self) -> bool {
        true
    }

    /// Whether the member reached the collection's completion flag (baptized)
    fn has_completed(&self) -> bool {
        false
    }
}

/// Membership limit; zero or unset means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capacity(Option<NonZeroU32>);

impl Capacity {
    pub const UNLIMITED: Capacity = Capacity(None);

    pub fn from_limit(limit: Option<u32>) -> Self {
        Self(limit.and_then(NonZeroU32::new))
    }

    pub fn limit(&self) -> Option<u32> {
        self.0.map(NonZeroU32::get)
    }

    pub fn is_unlimited(&self) -> bool {
        self.0.is_none()
    }

    /// Seats left for `occupied` members, `None` when unlimited
    pub fn remaining(&self, occupied: u32) -> Option<u32> {
        self.limit().map(|limit| limit.saturating_sub(occupied))
    }
}

/// Number of members currently occupying a seat
pub fn active_count<T: Enrollable>(members: &NestedCollection<T>) -> usize {
    members.iter().filter(|member| member.is_active()).count()
}

/// Decide whether `candidate` may join `members`.
///
/// Capacity is checked before duplicates, so a full collection reports
/// `CapacityExceeded` even for a caller who is already enrolled.
pub fn check_admission<T: Enrollable>(
    capacity: Capacity,
    members: &NestedCollection<T>,
    candidate: &T,
) -> Result<(), DomainError> {
    if let Some(limit) = capacity.limit() {
        if active_count(members) >= limit as usize {
            return Err(DomainError::CapacityExceeded { capacity: limit });
        }
    }

    if let Some(key) = candidate.enrollment_key() {
        let duplicate = members
            .iter()
            .filter(|member| member.is_active())
            .any(|member| member.enrollment_key() == Some(key));
        if duplicate {
            return Err(DomainError::AlreadyRegistered {
                key: key.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChildRecord;
    use uuid::Uuid;

    #[derive(Debug, Clone)]
    struct Seat {
        id: Uuid,
        key: Option<String>,
        active: bool,
    }

    impl Seat {
        fn keyed(key: &str) -> Self {
            Self {
                id: Uuid::nil(),
                key: Some(key.to_string()),
                active: true,
            }
        }
    }

    impl ChildRecord for Seat {
        const KIND: &'static str = "Seat";

        fn id(&self) -> Uuid {
            self.id
        }

        fn assign_id(&mut self, id: Uuid) {
            self.id = id;
        }
    }

    impl Enrollable for Seat {
        fn enrollment_key(&self) -> Option<&str> {
            self.key.as_deref()
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }

    fn filled(keys: &[&str]) -> NestedCollection<Seat> {
        let mut seats = NestedCollection::new();
        for key in keys {
            seats.insert(Seat::keyed(key));
        }
        seats
    }

    #[test]
    fn test_zero_capacity_is_unlimited() {
        assert!(Capacity::from_limit(Some(0)).is_unlimited());
        assert!(Capacity::from_limit(None).is_unlimited());
        assert_eq!(Capacity::from_limit(Some(3)).limit(), Some(3));
    }

    #[test]
    fn test_capacity_boundary() {
        let capacity = Capacity::from_limit(Some(3));

        let seats = filled(&["a", "b"]);
        assert!(check_admission(capacity, &seats, &Seat::keyed("c")).is_ok());

        let seats = filled(&["a", "b", "c"]);
        assert_eq!(
            check_admission(capacity, &seats, &Seat::keyed("d")),
            Err(DomainError::CapacityExceeded { capacity: 3 })
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let seats = filled(&["a"]);
        assert_eq!(
            check_admission(Capacity::UNLIMITED, &seats, &Seat::keyed("a")),
            Err(DomainError::AlreadyRegistered {
                key: "a".to_string()
            })
        );
    }

    #[test]
    fn test_key_match_is_exact() {
        let seats = filled(&["Ruth@example.com"]);
        assert!(check_admission(Capacity::UNLIMITED, &seats, &Seat::keyed("ruth@example.com")).is_ok());
    }

    #[test]
    fn test_missing_key_skips_duplicate_check() {
        let mut seats = NestedCollection::new();
        let anonymous = Seat {
            id: Uuid::nil(),
            key: None,
            active: true,
        };
        seats.insert(anonymous.clone());
        assert!(check_admission(Capacity::UNLIMITED, &seats, &anonymous).is_ok());
    }

    #[test]
    fn test_inactive_members_free_their_seat() {
        let mut seats = filled(&["a"]);
        seats.insert(Seat {
            id: Uuid::nil(),
            key: Some("b".to_string()),
            active: false,
        });
        let capacity = Capacity::from_limit(Some(2));

        assert!(check_admission(capacity, &seats, &Seat::keyed("b")).is_ok());
    }

    #[test]
    fn test_remaining() {
        assert_eq!(Capacity::from_limit(Some(5)).remaining(3), Some(2));
        assert_eq!(Capacity::from_limit(Some(5)).remaining(7), Some(0));
        assert_eq!(Capacity::UNLIMITED.remaining(7), None);
    }
}
