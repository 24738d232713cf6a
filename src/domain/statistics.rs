//! Derived Statistics
//!
//! Counters cached on aggregates. Every block is a pure function of the
//! nested collections it summarizes and is rebuilt from scratch after each
//! mutation; nothing here is ever incremented in place.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Capacity, DomainError, EngagementSet, Enrollable, NestedCollection};

pub fn to_counter(value: usize, what: &str) -> Result<u32, DomainError> {
    u32::try_from(value)
        .map_err(|_| DomainError::InvariantViolation(format!("{} overflows a counter", what)))
}

/// Percentage of `completed` over `registered`, two decimal places; zero when
/// nobody is registered.
pub fn completion_rate(completed: u32, registered: u32) -> Result<Decimal, DomainError> {
    if completed > registered {
        return Err(DomainError::InvariantViolation(format!(
            "{} completed members out of {} registered",
            completed, registered
        )));
    }
    if registered == 0 {
        return Ok(Decimal::ZERO);
    }

    let rate = (Decimal::from(completed) * Decimal::ONE_HUNDRED / Decimal::from(registered))
        .round_dp(2)
        .normalize();

    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(DomainError::InvariantViolation(format!(
            "completion rate {} outside 0..=100",
            rate
        )));
    }
    Ok(rate)
}

// =========================================================================
// Enrollment (baptism classes)
// =========================================================================

/// Statistics block for a class roster
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnrollmentStatistics {
    pub total_registered: u32,
    pub total_baptized: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub completion_rate: Decimal,
}

impl EnrollmentStatistics {
    /// Rebuild from the roster; inactive members are left out entirely.
    pub fn recompute<T: Enrollable>(members: &NestedCollection<T>) -> Result<Self, DomainError> {
        let active = members.iter().filter(|member| member.is_active());
        let (registered, completed) = active.fold((0usize, 0usize), |(total, done), member| {
            (total + 1, done + usize::from(member.has_completed()))
        });

        let total_registered = to_counter(registered, "total_registered")?;
        let total_baptized = to_counter(completed, "total_baptized")?;

        Ok(Self {
            total_registered,
            total_baptized,
            completion_rate: completion_rate(total_baptized, total_registered)?,
        })
    }
}

// =========================================================================
// Attendance (events)
// =========================================================================

/// Statistics block for an attendee list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttendanceStatistics {
    pub attendees_count: u32,
    /// `None` when the event has no capacity
    pub available_spots: Option<u32>,
}

impl AttendanceStatistics {
    pub fn recompute<T: Enrollable>(
        attendees: &NestedCollection<T>,
        capacity: Capacity,
    ) -> Result<Self, DomainError> {
        let attendees_count = to_counter(
            attendees.iter().filter(|attendee| attendee.is_active()).count(),
            "attendees_count",
        )?;

        Ok(Self {
            attendees_count,
            available_spots: capacity.remaining(attendees_count),
        })
    }
}

// =========================================================================
// Engagement (likes, favorites, comments)
// =========================================================================

/// A comment-like record that carries its own replies and likes
pub trait Threaded {
    fn reply_count(&self) -> usize;
    fn like_count(&self) -> usize;
}

/// Statistics block for a discussable aggregate
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngagementStatistics {
    pub likes_count: u32,
    pub favorites_count: u32,
    pub comments_count: u32,
    pub replies_count: u32,
    /// Aggregate likes plus likes on its comments
    pub total_likes: u32,
}

impl EngagementStatistics {
    pub fn recompute<C: Threaded>(
        likes: &EngagementSet,
        favorites: &EngagementSet,
        comments: &NestedCollection<C>,
    ) -> Result<Self, DomainError> {
        let replies: usize = comments.iter().map(Threaded::reply_count).sum();
        let comment_likes: usize = comments.iter().map(Threaded::like_count).sum();

        Ok(Self {
            likes_count: to_counter(likes.len(), "likes_count")?,
            favorites_count: to_counter(favorites.len(), "favorites_count")?,
            comments_count: to_counter(comments.len(), "comments_count")?,
            replies_count: to_counter(replies, "replies_count")?,
            total_likes: to_counter(likes.len() + comment_likes, "total_likes")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChildRecord;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[derive(Debug, Clone)]
    struct Member {
        id: Uuid,
        done: bool,
        active: bool,
    }

    impl Member {
        fn new(done: bool) -> Self {
            Self {
                id: Uuid::nil(),
                done,
                active: true,
            }
        }
    }

    impl ChildRecord for Member {
        const KIND: &'static str = "Member";

        fn id(&self) -> Uuid {
            self.id
        }

        fn assign_id(&mut self, id: Uuid) {
            self.id = id;
        }
    }

    impl Enrollable for Member {
        fn enrollment_key(&self) -> Option<&str> {
            None
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn has_completed(&self) -> bool {
            self.done
        }
    }

    struct Post {
        id: Uuid,
        replies: usize,
        likes: usize,
    }

    impl ChildRecord for Post {
        const KIND: &'static str = "Post";

        fn id(&self) -> Uuid {
            self.id
        }

        fn assign_id(&mut self, id: Uuid) {
            self.id = id;
        }
    }

    impl Threaded for Post {
        fn reply_count(&self) -> usize {
            self.replies
        }

        fn like_count(&self) -> usize {
            self.likes
        }
    }

    fn roster(flags: &[bool]) -> NestedCollection<Member> {
        let mut members = NestedCollection::new();
        for done in flags {
            members.insert(Member::new(*done));
        }
        members
    }

    #[test]
    fn test_empty_roster_has_zero_rate() {
        let stats = EnrollmentStatistics::recompute(&roster(&[])).unwrap();
        assert_eq!(stats, EnrollmentStatistics::default());
        assert_eq!(stats.completion_rate, Decimal::ZERO);
    }

    #[test]
    fn test_counts_follow_roster() {
        let stats = EnrollmentStatistics::recompute(&roster(&[true, false, false, true, false])).unwrap();
        assert_eq!(stats.total_registered, 5);
        assert_eq!(stats.total_baptized, 2);
        assert_eq!(stats.completion_rate, dec!(40));
    }

    #[test]
    fn test_rate_rounds_to_two_places() {
        let stats = EnrollmentStatistics::recompute(&roster(&[true, false, false])).unwrap();
        assert_eq!(stats.completion_rate, dec!(33.33));
    }

    #[test]
    fn test_inactive_members_excluded() {
        let mut members = roster(&[true, false]);
        members.insert(Member {
            id: Uuid::nil(),
            done: true,
            active: false,
        });

        let stats = EnrollmentStatistics::recompute(&members).unwrap();
        assert_eq!(stats.total_registered, 2);
        assert_eq!(stats.total_baptized, 1);
        assert_eq!(stats.completion_rate, dec!(50));
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let members = roster(&[true, false, true]);
        let first = EnrollmentStatistics::recompute(&members).unwrap();
        let second = EnrollmentStatistics::recompute(&members).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_rate_rejects_impossible_counts() {
        assert!(matches!(
            completion_rate(3, 2),
            Err(DomainError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_rate_bounds() {
        assert_eq!(completion_rate(0, 0).unwrap(), Decimal::ZERO);
        assert_eq!(completion_rate(4, 4).unwrap(), Decimal::ONE_HUNDRED);
        assert_eq!(completion_rate(1, 4).unwrap(), dec!(25));
    }

    #[test]
    fn test_attendance_available_spots() {
        let attendees = roster(&[false, false, false]);

        let bounded = AttendanceStatistics::recompute(&attendees, Capacity::from_limit(Some(10))).unwrap();
        assert_eq!(bounded.attendees_count, 3);
        assert_eq!(bounded.available_spots, Some(7));

        let unbounded = AttendanceStatistics::recompute(&attendees, Capacity::UNLIMITED).unwrap();
        assert_eq!(unbounded.available_spots, None);

        let overfull = AttendanceStatistics::recompute(&attendees, Capacity::from_limit(Some(2))).unwrap();
        assert_eq!(overfull.available_spots, Some(0));
    }

    #[test]
    fn test_engagement_totals() {
        let likes: EngagementSet = ["a", "b"].into_iter().collect();
        let favorites: EngagementSet = ["a"].into_iter().collect();
        let mut comments = NestedCollection::new();
        comments.insert(Post {
            id: Uuid::nil(),
            replies: 2,
            likes: 3,
        });
        comments.insert(Post {
            id: Uuid::nil(),
            replies: 0,
            likes: 1,
        });

        let stats = EngagementStatistics::recompute(&likes, &favorites, &comments).unwrap();
        assert_eq!(stats.likes_count, 2);
        assert_eq!(stats.favorites_count, 1);
        assert_eq!(stats.comments_count, 2);
        assert_eq!(stats.replies_count, 2);
        assert_eq!(stats.total_likes, 6);
    }

    #[test]
    fn test_rate_serializes_as_number() {
        let stats = EnrollmentStatistics::recompute(&roster(&[true, false, false, false])).unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["completion_rate"], 25.0);
        assert_eq!(json["total_registered"], 4);
    }
}
