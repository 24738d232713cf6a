//! Command definitions
//!
//! Commands represent intentions to change the system state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::baptism::{SessionDraft, StudentApplication, StudentChanges};

// =========================================================================
// Event registration
// =========================================================================

/// Command to register the caller for an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAttendeeCommand {
    pub event_id: Uuid,
    pub email: Option<String>,
}

impl RegisterAttendeeCommand {
    pub fn new(event_id: Uuid) -> Self {
        Self {
            event_id,
            email: None,
        }
    }

    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }
}

/// Command to drop a user's registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRegistrationCommand {
    pub event_id: Uuid,
    pub user_id: String,
}

impl CancelRegistrationCommand {
    pub fn new(event_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            event_id,
            user_id: user_id.into(),
        }
    }
}

// =========================================================================
// Baptism class roster
// =========================================================================

/// Command to enroll a student in a class
#[derive(Debug, Clone)]
pub struct EnrollStudentCommand {
    pub class_id: Uuid,
    pub application: StudentApplication,
}

impl EnrollStudentCommand {
    pub fn new(class_id: Uuid, application: StudentApplication) -> Self {
        Self {
            class_id,
            application,
        }
    }
}

/// Command to change a student's details, status or baptism flag
#[derive(Debug, Clone)]
pub struct UpdateStudentCommand {
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub changes: StudentChanges,
}

impl UpdateStudentCommand {
    pub fn new(class_id: Uuid, student_id: Uuid, changes: StudentChanges) -> Self {
        Self {
            class_id,
            student_id,
            changes,
        }
    }
}

/// Command to record a preparation session
#[derive(Debug, Clone)]
pub struct AddSessionCommand {
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub session: SessionDraft,
}

impl AddSessionCommand {
    pub fn new(class_id: Uuid, student_id: Uuid, session: SessionDraft) -> Self {
        Self {
            class_id,
            student_id,
            session,
        }
    }
}

// =========================================================================
// Discussions
// =========================================================================

/// Where a comment or reply goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadTarget {
    pub document_id: Uuid,
    pub comment_id: Option<Uuid>,
}

impl ThreadTarget {
    pub fn document(document_id: Uuid) -> Self {
        Self {
            document_id,
            comment_id: None,
        }
    }

    pub fn comment(document_id: Uuid, comment_id: Uuid) -> Self {
        Self {
            document_id,
            comment_id: Some(comment_id),
        }
    }
}

/// Command to post a comment, or a reply when the target names a comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCommentCommand {
    pub target: ThreadTarget,
    pub text: String,
}

impl PostCommentCommand {
    pub fn new(target: ThreadTarget, text: impl Into<String>) -> Self {
        Self {
            target,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_command_builder() {
        let event_id = Uuid::new_v4();
        let command = RegisterAttendeeCommand::new(event_id).with_email("ruth@example.com".to_string());
        assert_eq!(command.event_id, event_id);
        assert_eq!(command.email.as_deref(), Some("ruth@example.com"));
    }

    #[test]
    fn test_thread_targets() {
        let document_id = Uuid::new_v4();
        let comment_id = Uuid::new_v4();
        assert_eq!(ThreadTarget::document(document_id).comment_id, None);
        assert_eq!(
            ThreadTarget::comment(document_id, comment_id).comment_id,
            Some(comment_id)
        );
    }
}
