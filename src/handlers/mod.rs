//! Command Handlers module
//!
//! Handlers that orchestrate one operation each: authorize the caller, load
//! the aggregate, apply the domain mutation and persist it through the
//! repository.

mod baptism_handler;
mod commands;
mod discussion_handler;
mod document_handler;
mod event_handler;
mod study_handler;
mod video_handler;


pub use baptism_handler::{BaptismHandler, RosterExport};
pub use commands::*;
pub use discussion_handler::{DiscussionHandler, EngagementResult, Posted};
pub use document_handler::{DocumentHandler, ListResult, Page};
pub use event_handler::{EventHandler, RegistrationResult};
pub use study_handler::{StudyHandler, DEFAULT_TAG_LIMIT};
pub use video_handler::VideoHandler;

use crate::domain::{Identity, OperationContext};
use crate::error::AppError;

/// The caller's identity, or `MissingHeader` for anonymous requests
pub(crate) fn require_identity(context: &OperationContext) -> Result<&Identity, AppError> {
    context
        .identity
        .as_ref()
        .ok_or_else(|| AppError::MissingHeader("X-User-Id".to_string()))
}

/// The caller's identity when it carries the admin role
pub(crate) fn require_admin(context: &OperationContext) -> Result<&Identity, AppError> {
    let identity = require_identity(context)?;
    if identity.is_admin() {
        Ok(identity)
    } else {
        Err(AppError::PermissionDenied)
    }
}
