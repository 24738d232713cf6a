//! API Routes
//!
//! HTTP endpoint definitions. Every document kind gets the same CRUD
//! endpoints; discussable kinds also get likes, favorites and threads.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::video::VideoSummary;
use crate::aggregate::study::{StudySummary, TagCount};
use crate::aggregate::{
    BaptismClass, Comment, DailyPreaching, Discussable, Document, Event, Sermon, Study, Video,
};
use crate::domain::{EngagementStatistics, OperationContext};
use crate::error::AppError;
use crate::handlers::{
    DiscussionHandler, DocumentHandler, EngagementResult, ListResult, Page, PostCommentCommand,
    Posted, StudyHandler, ThreadTarget, VideoHandler,
};

use super::extract::JsonBody;
use super::{baptism, events, AppState};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CounterResponse {
    pub id: Uuid,
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    pub limit: Option<usize>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    let router = Router::new();

    let router = document_routes::<Event>(router, "/events");
    let router = events::routes(router);

    let router = document_routes::<BaptismClass>(router, "/baptism-classes");
    let router = baptism::routes(router);

    let router = document_routes::<Study>(router, "/studies");
    let router = discussion_routes::<Study>(router, "/studies");
    let router = router
        .route("/studies/stats/summary", get(study_summary))
        .route("/studies/tags/popular", get(popular_tags))
        .route("/studies/:id/share", post(share_study));

    let router = document_routes::<Sermon>(router, "/sermons");
    let router = discussion_routes::<Sermon>(router, "/sermons");

    let router = document_routes::<DailyPreaching>(router, "/daily-preachings");
    let router = discussion_routes::<DailyPreaching>(router, "/daily-preachings");

    let router = document_routes::<Video>(router, "/videos");
    let router = discussion_routes::<Video>(router, "/videos");
    router
        .route("/videos/stats/summary", get(video_summary))
        .route("/videos/:id/view", post(record_video_play))
}

/// CRUD endpoints for one document kind under `base`
fn document_routes<A: Document>(router: Router<AppState>, base: &str) -> Router<AppState> {
    router
        .route(base, get(list_documents::<A>))
        .route(base, post(create_document::<A>))
        .route(&format!("{base}/:id"), get(get_document::<A>))
        .route(&format!("{base}/:id"), patch(update_document::<A>))
        .route(&format!("{base}/:id"), delete(delete_document::<A>))
}

/// Engagement endpoints for one discussable kind under `base`
fn discussion_routes<A: Discussable>(router: Router<AppState>, base: &str) -> Router<AppState> {
    router
        .route(&format!("{base}/:id/like"), post(toggle_like::<A>))
        .route(&format!("{base}/:id/favorite"), post(toggle_favorite::<A>))
        .route(&format!("{base}/:id/comments"), post(add_comment::<A>))
        .route(
            &format!("{base}/:id/comments/:comment_id"),
            patch(edit_comment::<A>),
        )
        .route(
            &format!("{base}/:id/comments/:comment_id"),
            delete(delete_comment::<A>),
        )
        .route(
            &format!("{base}/:id/comments/:comment_id/like"),
            post(toggle_comment_like::<A>),
        )
        .route(
            &format!("{base}/:id/comments/:comment_id/replies"),
            post(add_reply::<A>),
        )
        .route(
            &format!("{base}/:id/comments/:comment_id/replies/:reply_id"),
            delete(delete_reply::<A>),
        )
}

// =========================================================================
// Documents
// =========================================================================

async fn create_document<A: Document>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    JsonBody(draft): JsonBody<A::Draft>,
) -> Result<(StatusCode, Json<A::View>), AppError> {
    let view = DocumentHandler::<A>::new(state.store)
        .create(draft, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_document<A: Document>(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<A::View>, AppError> {
    let view = DocumentHandler::<A>::new(state.store).get(id).await?;
    Ok(Json(view))
}

async fn list_documents<A: Document>(
    State(state): State<AppState>,
    Query(filter): Query<A::Filter>,
    Query(page): Query<Page>,
) -> Result<Json<ListResult<A::View>>, AppError> {
    let result = DocumentHandler::<A>::new(state.store)
        .list(&filter, page)
        .await?;
    Ok(Json(result))
}

async fn update_document<A: Document>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
    JsonBody(patch): JsonBody<A::Patch>,
) -> Result<Json<A::View>, AppError> {
    let view = DocumentHandler::<A>::new(state.store)
        .update(id, patch, &context)
        .await?;
    Ok(Json(view))
}

async fn delete_document<A: Document>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    DocumentHandler::<A>::new(state.store)
        .delete(id, &context)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// Discussions
// =========================================================================

async fn toggle_like<A: Discussable>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<EngagementResult>, AppError> {
    let result = DiscussionHandler::<A>::new(state.store)
        .toggle_like(id, &context)
        .await?;
    Ok(Json(result))
}

async fn toggle_favorite<A: Discussable>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<EngagementResult>, AppError> {
    let result = DiscussionHandler::<A>::new(state.store)
        .toggle_favorite(id, &context)
        .await?;
    Ok(Json(result))
}

async fn add_comment<A: Discussable>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<CommentRequest>,
) -> Result<(StatusCode, Json<Posted>), AppError> {
    let command = PostCommentCommand::new(ThreadTarget::document(id), request.text);
    let posted = DiscussionHandler::<A>::new(state.store)
        .post(command, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(posted)))
}

async fn edit_comment<A: Discussable>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
    JsonBody(request): JsonBody<CommentRequest>,
) -> Result<Json<Comment>, AppError> {
    let comment = DiscussionHandler::<A>::new(state.store)
        .edit_comment(id, comment_id, request.text, &context)
        .await?;
    Ok(Json(comment))
}

async fn delete_comment<A: Discussable>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EngagementStatistics>, AppError> {
    let statistics = DiscussionHandler::<A>::new(state.store)
        .delete_comment(id, comment_id, &context)
        .await?;
    Ok(Json(statistics))
}

async fn toggle_comment_like<A: Discussable>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EngagementResult>, AppError> {
    let result = DiscussionHandler::<A>::new(state.store)
        .toggle_comment_like(id, comment_id, &context)
        .await?;
    Ok(Json(result))
}

async fn add_reply<A: Discussable>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
    JsonBody(request): JsonBody<CommentRequest>,
) -> Result<(StatusCode, Json<Posted>), AppError> {
    let command = PostCommentCommand::new(ThreadTarget::comment(id, comment_id), request.text);
    let posted = DiscussionHandler::<A>::new(state.store)
        .post(command, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(posted)))
}

async fn delete_reply<A: Discussable>(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path((id, comment_id, reply_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<EngagementStatistics>, AppError> {
    let statistics = DiscussionHandler::<A>::new(state.store)
        .delete_reply(id, comment_id, reply_id, &context)
        .await?;
    Ok(Json(statistics))
}

// =========================================================================
// Studies
// =========================================================================

async fn share_study(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CounterResponse>, AppError> {
    let count = StudyHandler::new(state.store).share(id).await?;
    Ok(Json(CounterResponse { id, count }))
}

async fn study_summary(State(state): State<AppState>) -> Result<Json<StudySummary>, AppError> {
    Ok(Json(StudyHandler::new(state.store).summary().await?))
}

async fn popular_tags(
    State(state): State<AppState>,
    Query(query): Query<TagQuery>,
) -> Result<Json<Vec<TagCount>>, AppError> {
    let tags = StudyHandler::new(state.store)
        .popular_tags(query.limit)
        .await?;
    Ok(Json(tags))
}

// =========================================================================
// Videos
// =========================================================================

async fn record_video_play(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CounterResponse>, AppError> {
    let count = VideoHandler::new(state.store).record_play(id).await?;
    Ok(Json(CounterResponse { id, count }))
}

async fn video_summary(State(state): State<AppState>) -> Result<Json<VideoSummary>, AppError> {
    Ok(Json(VideoHandler::new(state.store).summary().await?))
}
