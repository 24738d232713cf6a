//! Event registration and administration endpoints

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::event::{EventSummary, EventView};
use crate::domain::{AttendanceStatistics, OperationContext};
use crate::error::AppError;
use crate::handlers::{
    require_identity, CancelRegistrationCommand, EventHandler, RegisterAttendeeCommand,
    RegistrationResult,
};

use super::extract::JsonBody;
use super::AppState;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TagsRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

pub(super) fn routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/events/stats/summary", get(summary))
        .route("/events/reminders/upcoming", get(reminders))
        .route("/events/:id/register", post(register))
        .route("/events/:id/register", delete(cancel_own_registration))
        .route("/events/:id/attendees/:user_id", delete(cancel_registration))
        .route("/events/:id/featured", post(toggle_featured))
        .route("/events/:id/tags", post(add_tags))
}

async fn register(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
    request: Option<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<RegistrationResult>), AppError> {
    let mut command = RegisterAttendeeCommand::new(id);
    if let Some(email) = request.and_then(|Json(request)| request.email) {
        command = command.with_email(email);
    }

    let result = EventHandler::new(state.store)
        .register(command, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn cancel_own_registration(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<AttendanceStatistics>, AppError> {
    let user_id = require_identity(&context)?.user_id.clone();
    let statistics = EventHandler::new(state.store)
        .cancel_registration(CancelRegistrationCommand::new(id, user_id), &context)
        .await?;
    Ok(Json(statistics))
}

async fn cancel_registration(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((id, user_id)): Path<(Uuid, String)>,
) -> Result<Json<AttendanceStatistics>, AppError> {
    let statistics = EventHandler::new(state.store)
        .cancel_registration(CancelRegistrationCommand::new(id, user_id), &context)
        .await?;
    Ok(Json(statistics))
}

async fn toggle_featured(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventView>, AppError> {
    let view = EventHandler::new(state.store)
        .toggle_featured(id, &context)
        .await?;
    Ok(Json(view))
}

async fn add_tags(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<TagsRequest>,
) -> Result<Json<TagsResponse>, AppError> {
    let tags = EventHandler::new(state.store)
        .add_tags(id, request.tags, &context)
        .await?;
    Ok(Json(TagsResponse { tags }))
}

async fn summary(State(state): State<AppState>) -> Result<Json<EventSummary>, AppError> {
    Ok(Json(EventHandler::new(state.store).summary().await?))
}

async fn reminders(State(state): State<AppState>) -> Result<Json<Vec<EventView>>, AppError> {
    Ok(Json(EventHandler::new(state.store).reminders().await?))
}
