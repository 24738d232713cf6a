//! Request extractors

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON request body; malformed bodies are reported as `AppError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
