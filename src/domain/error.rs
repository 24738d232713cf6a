//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Enrollment and engagement rule failures.
///
/// These errors represent business rule violations and invariant failures
/// raised while mutating an aggregate in memory. They are independent of the
/// web/persistence layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Aggregate or child record missing
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Membership collection is full
    #[error("Capacity exceeded: limit of {capacity} reached")]
    CapacityExceeded { capacity: u32 },

    /// A member with the same key is already enrolled
    #[error("Already registered: {key}")]
    AlreadyRegistered { key: String },

    /// Malformed input to an insertion or update
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Caller may not change a record authored by someone else
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Enrollment status change not permitted from the current state
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Derived statistics would be inconsistent with the nested state
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }

    /// Check if the aggregate rejected the insertion because of its membership
    pub fn is_enrollment_rejection(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::AlreadyRegistered { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DomainError::not_found("Student", "abc");
        assert_eq!(err.to_string(), "Student not found: abc");
        assert!(err.is_client_error());
        assert!(!err.is_enrollment_rejection());
    }

    #[test]
    fn test_enrollment_rejections() {
        assert!(DomainError::CapacityExceeded { capacity: 2 }.is_enrollment_rejection());
        assert!(DomainError::AlreadyRegistered {
            key: "u1".to_string()
        }
        .is_enrollment_rejection());
    }

    #[test]
    fn test_invariant_violation_is_server_side() {
        let err = DomainError::InvariantViolation("negative count".to_string());
        assert!(!err.is_client_error());
    }
}
