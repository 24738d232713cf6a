//! Event Handler
//!
//! Handles registration for events and the event-specific administration
//! that sits beside plain document CRUD.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::event::{upcoming_within_a_day, EventSummary, EventView, Registration};
use crate::aggregate::{Document, Event};
use crate::domain::{AttendanceStatistics, OperationContext};
use crate::error::AppError;
use crate::store::{DocumentStore, Repository};

use super::{require_admin, require_identity, CancelRegistrationCommand, RegisterAttendeeCommand};

/// Result of a successful registration
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationResult {
    pub registration: Registration,
    pub statistics: AttendanceStatistics,
}

/// Handler for event registration and administration
pub struct EventHandler {
    repository: Repository<Event>,
}

impl EventHandler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    /// Register the caller for an event
    pub async fn register(
        &self,
        command: RegisterAttendeeCommand,
        context: &OperationContext,
    ) -> Result<RegistrationResult, AppError> {
        let identity = require_identity(context)?;

        let (event, registration) = self
            .repository
            .mutate(command.event_id, |event| {
                event.register(identity, command.email.as_deref(), Utc::now())
            })
            .await?;

        tracing::info!(
            event_id = %command.event_id,
            user_id = %identity.user_id,
            attendees = event.statistics.attendees_count,
            "Attendee registered"
        );

        Ok(RegistrationResult {
            registration,
            statistics: event.statistics,
        })
    }

    /// Cancel a registration; members may only cancel their own
    pub async fn cancel_registration(
        &self,
        command: CancelRegistrationCommand,
        context: &OperationContext,
    ) -> Result<AttendanceStatistics, AppError> {
        let identity = require_identity(context)?;
        if !identity.can_modify(&command.user_id) {
            return Err(AppError::PermissionDenied);
        }

        let (event, _) = self
            .repository
            .mutate(command.event_id, |event| {
                event.cancel_registration(&command.user_id)
            })
            .await?;

        tracing::info!(
            event_id = %command.event_id,
            user_id = %command.user_id,
            "Registration cancelled"
        );
        Ok(event.statistics)
    }

    pub async fn toggle_featured(
        &self,
        event_id: Uuid,
        context: &OperationContext,
    ) -> Result<EventView, AppError> {
        require_admin(context)?;
        let (event, is_featured) = self
            .repository
            .mutate(event_id, |event| Ok(event.toggle_featured()))
            .await?;

        tracing::info!(event_id = %event_id, is_featured, "Event featured flag toggled");
        Ok(event.into_view(Utc::now()))
    }

    pub async fn add_tags(
        &self,
        event_id: Uuid,
        tags: Vec<String>,
        context: &OperationContext,
    ) -> Result<Vec<String>, AppError> {
        require_admin(context)?;
        let (event, _) = self
            .repository
            .mutate(event_id, |event| {
                event.add_tags(tags.clone());
                Ok(())
            })
            .await?;
        Ok(event.tags)
    }

    pub async fn summary(&self) -> Result<EventSummary, AppError> {
        let events = self.repository.list().await?;
        Ok(EventSummary::from_events(&events, Utc::now()))
    }

    /// Published events starting within the next day, for reminder dispatch
    pub async fn reminders(&self) -> Result<Vec<EventView>, AppError> {
        let now = Utc::now();
        let events = self.repository.list().await?;
        Ok(upcoming_within_a_day(events, now)
            .into_iter()
            .map(|event| event.into_view(now))
            .collect())
    }
}
