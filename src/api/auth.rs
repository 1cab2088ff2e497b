//! Authentication middleware for the REST API
//!
//! When `ApiConfig::api_key` is set, every request must carry a matching
//! `X-Api-Key` header or it receives 401 Unauthorized.

use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests whose `X-Api-Key` header does not match the configured key
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware};
/// use voicenote_dl::api::auth::require_api_key;
///
/// let api_key = Some("secret-key-123".to_string());
/// let router: Router = Router::new()
///     .layer(middleware::from_fn_with_state(api_key, require_api_key));
/// ```
pub async fn require_api_key(
    State(expected_api_key): State<Option<String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected_key) = expected_api_key else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), expected_key.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
            ApiError::unauthorized("Invalid API key").into_response()
        }
        None => ApiError::unauthorized("Missing X-Api-Key header").into_response(),
    }
}

/// Compares every byte regardless of where the first mismatch is
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
