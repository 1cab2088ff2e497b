//! Bulk retrieval handlers.

use super::{DownloadVoicesAllRequest, DownloadVoicesRequest};
use crate::api::AppState;
use crate::types::Progress;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /download-voices - Download the voice notes of one chat
#[utoipa::path(
    post,
    path = "/download-voices",
    tag = "retrieval",
    request_body = DownloadVoicesRequest,
    responses(
        (status = 202, description = "Job accepted; progress right after selection", body = Progress),
        (status = 400, description = "Invalid chat id or limit", body = crate::error::ApiError),
        (status = 409, description = "A job is already running", body = crate::error::ApiError),
        (status = 503, description = "Session not connected", body = crate::error::ApiError)
    )
)]
pub async fn download_voices(
    State(state): State<AppState>,
    Json(request): Json<DownloadVoicesRequest>,
) -> Response {
    match state
        .relay
        .download_voices(&request.chat_id, request.limit, request.output_dir)
        .await
    {
        Ok(progress) => (StatusCode::ACCEPTED, Json(progress)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /download-voices-all - Download the voice notes of every chat
#[utoipa::path(
    post,
    path = "/download-voices-all",
    tag = "retrieval",
    request_body = DownloadVoicesAllRequest,
    responses(
        (status = 202, description = "Job accepted; progress right after selection", body = Progress),
        (status = 400, description = "Invalid limit", body = crate::error::ApiError),
        (status = 409, description = "A job is already running", body = crate::error::ApiError),
        (status = 503, description = "Session not connected", body = crate::error::ApiError)
    )
)]
pub async fn download_voices_all(
    State(state): State<AppState>,
    Json(request): Json<DownloadVoicesAllRequest>,
) -> Response {
    match state
        .relay
        .download_voices_all(request.limit, request.output_dir)
        .await
    {
        Ok(progress) => (StatusCode::ACCEPTED, Json(progress)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /download-progress - Progress of the current or last job
#[utoipa::path(
    get,
    path = "/download-progress",
    tag = "retrieval",
    responses(
        (status = 200, description = "Progress snapshot", body = Progress)
    )
)]
pub async fn download_progress(State(state): State<AppState>) -> Json<Progress> {
    Json(state.relay.retrieval().progress())
}

/// POST /download-stop - Stop the running job
///
/// A no-op unless a job is running. Stopped jobs cannot be resumed.
#[utoipa::path(
    post,
    path = "/download-stop",
    tag = "retrieval",
    responses(
        (status = 200, description = "Progress after the stop request", body = Progress)
    )
)]
pub async fn download_stop(State(state): State<AppState>) -> Json<Progress> {
    Json(state.relay.retrieval().stop())
}
