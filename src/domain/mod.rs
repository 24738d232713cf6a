//! Domain module
//!
//! Core domain types and business logic: nested collections, enrollment
//! rules, engagement toggles and derived statistics.

pub mod collection;
pub mod context;
pub mod engagement;
pub mod enrollment;
pub mod error;
pub mod statistics;

pub use collection::{ChildRecord, NestedCollection};
pub use context::{Identity, OperationContext, Role};
pub use engagement::{EngagementSet, ToggleOutcome};
pub use enrollment::{active_count, check_admission, Capacity, Enrollable};
pub use error::DomainError;
pub use statistics::{
    completion_rate, to_counter, AttendanceStatistics, EngagementStatistics, EnrollmentStatistics,
    Threaded,
};
