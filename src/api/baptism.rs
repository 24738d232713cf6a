//! Baptism class roster endpoints

use axum::{
    extract::{Extension, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use uuid::Uuid;

use crate::aggregate::baptism::{SessionDraft, StatusReport, StudentApplication, StudentChanges};
use crate::aggregate::{BaptismClass, Student};
use crate::domain::OperationContext;
use crate::error::AppError;
use crate::handlers::{AddSessionCommand, BaptismHandler, EnrollStudentCommand, UpdateStudentCommand};

use super::extract::JsonBody;
use super::AppState;

pub(super) fn routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/baptism-classes/:id/students", post(enroll))
        .route(
            "/baptism-classes/:id/students/:student_id",
            patch(update_student),
        )
        .route(
            "/baptism-classes/:id/students/:student_id",
            delete(remove_student),
        )
        .route(
            "/baptism-classes/:id/students/:student_id/sessions",
            post(add_session),
        )
        .route("/baptism-classes/:id/report", get(status_report))
        .route("/baptism-classes/:id/export", get(export))
}

async fn enroll(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(application): JsonBody<StudentApplication>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = BaptismHandler::new(state.store)
        .enroll(EnrollStudentCommand::new(id, application))
        .await?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn update_student(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
    JsonBody(changes): JsonBody<StudentChanges>,
) -> Result<Json<Student>, AppError> {
    let student = BaptismHandler::new(state.store)
        .update_student(UpdateStudentCommand::new(id, student_id, changes), &context)
        .await?;
    Ok(Json(student))
}

async fn add_session(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
    JsonBody(session): JsonBody<SessionDraft>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = BaptismHandler::new(state.store)
        .add_session(AddSessionCommand::new(id, student_id, session), &context)
        .await?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn remove_student(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BaptismClass>, AppError> {
    let class = BaptismHandler::new(state.store)
        .remove_student(id, student_id, &context)
        .await?;
    Ok(Json(class))
}

async fn status_report(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusReport>, AppError> {
    let report = BaptismHandler::new(state.store)
        .status_report(id, &context)
        .await?;
    Ok(Json(report))
}

async fn export(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let export = BaptismHandler::new(state.store)
        .export(id, &context)
        .await?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.csv,
    ))
}
