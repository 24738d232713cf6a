//! Operation Context
//!
//! Caller identity and tracing metadata for the current operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DomainError;

/// Role supplied by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl Role {
    /// Parse a role header value; unknown roles fall back to member
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Member
        }
    }
}

/// Caller identity, trusted as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this caller may modify something authored by `author_id`
    pub fn can_modify(&self, author_id: &str) -> bool {
        self.is_admin() || self.user_id == author_id
    }

    /// Fail unless this caller may modify something authored by `author_id`
    pub fn ensure_can_modify(&self, author_id: &str) -> Result<(), DomainError> {
        if self.can_modify(author_id) {
            Ok(())
        } else {
            Err(DomainError::forbidden("only the author or an admin may change this"))
        }
    }
}

/// Context for an operation, used for attribution and tracing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OperationContext {
    /// Caller identity from the X-User-* headers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with a caller identity
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    /// Display name to attribute authored content to
    pub fn actor_name(&self) -> &str {
        self.identity
            .as_ref()
            .map(|identity| identity.display_name.as_str())
            .unwrap_or("Guest")
    }
}
