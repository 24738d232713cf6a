//! API Middleware
//!
//! Caller identity, API key check and request logging.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{Identity, OperationContext, Role};
use crate::error::AppError;

use super::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_NAME_HEADER: &str = "X-User-Name";
pub const USER_ROLE_HEADER: &str = "X-User-Role";
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Hex SHA-256 of a presented API key
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Caller identity from the X-User-* headers; absent without a user id
pub fn identity_from_headers(headers: &HeaderMap) -> Option<Identity> {
    let user_id = header_value(headers, USER_ID_HEADER)?;
    let display_name = header_value(headers, USER_NAME_HEADER).unwrap_or(user_id);
    let role = header_value(headers, USER_ROLE_HEADER)
        .map(Role::parse)
        .unwrap_or_default();
    Some(Identity::new(user_id, display_name, role))
}

// =========================================================================
// Identity middleware
// =========================================================================

/// Check the API key when one is configured and attach the operation context
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let headers = request.headers();

    if let Some(expected) = &state.api_key_sha256 {
        let presented = header_value(headers, API_KEY_HEADER).map(hash_api_key);
        if presented.as_deref() != Some(expected.as_str()) {
            tracing::warn!(uri = %request.uri(), "Rejected request with missing or invalid API key");
            return Err(AppError::InvalidApiKey.into_response());
        }
    }

    let correlation_id = header_value(headers, CORRELATION_ID_HEADER)
        .and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::new_v4);

    let mut context = OperationContext::new().with_correlation_id(correlation_id);
    if let Some(identity) = identity_from_headers(headers) {
        context = context.with_identity(identity);
    }

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

// =========================================================================
// Header masking
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &[
    "x-api-key",
    "authorization",
    "cookie",
    "set-cookie",
];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request logging
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());

    let context = request.extensions().get::<OperationContext>();
    let correlation_id = context.and_then(|ctx| ctx.correlation_id);
    let user_id = context
        .and_then(|ctx| ctx.identity.as_ref())
        .map(|identity| identity.user_id.clone());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        correlation_id = ?correlation_id,
        user_id = ?user_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}
