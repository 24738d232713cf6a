//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Persistence errors
    #[error(transparent)]
    Store(#[from] StoreError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        self.classify().0
    }

    fn classify(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::MissingHeader(header) => {
                (StatusCode::BAD_REQUEST, "missing_header", Some(header.clone()))
            }

            // 401 Unauthorized
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid_api_key", None),

            // 403 Forbidden
            AppError::PermissionDenied => (StatusCode::FORBIDDEN, "permission_denied", None),

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::NotFound { kind, id } => {
                    (StatusCode::NOT_FOUND, "not_found", Some(format!("{} {}", kind, id)))
                }
                DomainError::CapacityExceeded { capacity } => (
                    StatusCode::CONFLICT,
                    "capacity_exceeded",
                    Some(format!("capacity {}", capacity)),
                ),
                DomainError::AlreadyRegistered { key } => {
                    (StatusCode::CONFLICT, "already_registered", Some(key.clone()))
                }
                DomainError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "validation_failed", Some(msg.clone()))
                }
                DomainError::Forbidden(msg) => {
                    (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone()))
                }
                DomainError::InvalidTransition { from, to } => (
                    StatusCode::BAD_REQUEST,
                    "invalid_transition",
                    Some(format!("{} -> {}", from, to)),
                ),
                DomainError::InvariantViolation(msg) => {
                    tracing::error!("Invariant violation: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "invariant_violation", None)
                }
            },

            AppError::Store(store_err) => match store_err {
                StoreError::ConcurrencyConflict { .. } | StoreError::MaxRetriesExceeded { .. } => {
                    (StatusCode::CONFLICT, "version_conflict", None)
                }
                StoreError::DocumentNotFound { kind, id } => {
                    (StatusCode::NOT_FOUND, "not_found", Some(format!("{} {}", kind, id)))
                }
                StoreError::DuplicateDocument { .. } => {
                    (StatusCode::CONFLICT, "duplicate_document", None)
                }
                StoreError::Database(e) => {
                    tracing::error!("Database error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
                StoreError::Serialization(e) => {
                    tracing::error!("Serialization error: {:?}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", None)
                }
            },

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.classify();

        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_domain_status_mapping() {
        let cases = [
            (DomainError::not_found("Event", "x"), StatusCode::NOT_FOUND),
            (DomainError::CapacityExceeded { capacity: 2 }, StatusCode::CONFLICT),
            (
                DomainError::AlreadyRegistered {
                    key: "u1".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (DomainError::forbidden("no"), StatusCode::FORBIDDEN),
            (
                DomainError::InvalidTransition {
                    from: "dropped".to_string(),
                    to: "ready".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::InvariantViolation("broken".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::from(error).status_code(), status);
        }
    }

    #[test]
    fn test_store_conflict_is_409() {
        let error = AppError::from(StoreError::MaxRetriesExceeded {
            kind: "Event".to_string(),
            id: Uuid::new_v4(),
        });
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_header_errors() {
        assert_eq!(
            AppError::MissingHeader("X-User-Id".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidApiKey.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::PermissionDenied.status_code(), StatusCode::FORBIDDEN);
    }
}
