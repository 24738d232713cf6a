//! Baptism Class Handler
//!
//! Roster operations for baptism classes. Enrollment is open to anyone;
//! every other roster change is administrative.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::aggregate::baptism::StatusReport;
use crate::aggregate::{BaptismClass, Student};
use crate::domain::OperationContext;
use crate::error::AppError;
use crate::store::{DocumentStore, Repository};

use super::{require_admin, AddSessionCommand, EnrollStudentCommand, UpdateStudentCommand};

/// CSV roster ready for download
#[derive(Debug, Clone)]
pub struct RosterExport {
    pub filename: String,
    pub csv: String,
}

/// Handler for the student roster of a baptism class
pub struct BaptismHandler {
    repository: Repository<BaptismClass>,
}

impl BaptismHandler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    pub async fn enroll(&self, command: EnrollStudentCommand) -> Result<Student, AppError> {
        let (class, student) = self
            .repository
            .mutate(command.class_id, |class| {
                class.enroll(&command.application, Utc::now())
            })
            .await?;

        tracing::info!(
            class_id = %command.class_id,
            student_id = %student.id,
            total_registered = class.statistics.total_registered,
            "Student enrolled"
        );
        Ok(student)
    }

    pub async fn update_student(
        &self,
        command: UpdateStudentCommand,
        context: &OperationContext,
    ) -> Result<Student, AppError> {
        require_admin(context)?;
        let (_, student) = self
            .repository
            .mutate(command.class_id, |class| {
                class.update_student(command.student_id, &command.changes, Utc::now())
            })
            .await?;

        tracing::info!(
            class_id = %command.class_id,
            student_id = %command.student_id,
            status = %student.status,
            "Student updated"
        );
        Ok(student)
    }

    pub async fn add_session(
        &self,
        command: AddSessionCommand,
        context: &OperationContext,
    ) -> Result<Student, AppError> {
        require_admin(context)?;
        let (_, student) = self
            .repository
            .mutate(command.class_id, |class| {
                class.add_session(command.student_id, &command.session, Utc::now())
            })
            .await?;

        tracing::debug!(
            class_id = %command.class_id,
            student_id = %command.student_id,
            sessions = student.preparation_sessions.len(),
            "Preparation session recorded"
        );
        Ok(student)
    }

    pub async fn remove_student(
        &self,
        class_id: Uuid,
        student_id: Uuid,
        context: &OperationContext,
    ) -> Result<BaptismClass, AppError> {
        require_admin(context)?;
        let (class, removed) = self
            .repository
            .mutate(class_id, |class| class.remove_student(student_id))
            .await?;

        tracing::info!(class_id = %class_id, student_id = %removed.id, "Student removed");
        Ok(class)
    }

    pub async fn status_report(
        &self,
        class_id: Uuid,
        context: &OperationContext,
    ) -> Result<StatusReport, AppError> {
        require_admin(context)?;
        Ok(self.repository.load(class_id).await?.status_report()?)
    }

    pub async fn export(
        &self,
        class_id: Uuid,
        context: &OperationContext,
    ) -> Result<RosterExport, AppError> {
        require_admin(context)?;
        let class = self.repository.load(class_id).await?;
        Ok(RosterExport {
            filename: class.export_filename(),
            csv: class.export_csv(),
        })
    }
}
