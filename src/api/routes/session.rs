//! Session handlers: status, pairing code, sending.

use super::{QrResponse, SendAudioRequest, SendResponse, SendTextRequest, StatusResponse};
use crate::api::AppState;
use crate::error::ApiError;
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

/// GET /status - Connection state
#[utoipa::path(
    get,
    path = "/status",
    tag = "session",
    responses(
        (status = 200, description = "Connection state and reconnect attempts", body = StatusResponse)
    )
)]
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let session = state.relay.session();
    Json(StatusResponse {
        status: session.status(),
        reconnect_attempts: session.reconnect_attempts(),
    })
}

/// GET /qr - Pairing code
#[utoipa::path(
    get,
    path = "/qr",
    tag = "session",
    responses(
        (status = 200, description = "Pairing code while pairing, null otherwise", body = QrResponse)
    )
)]
pub async fn get_qr(State(state): State<AppState>) -> Json<QrResponse> {
    let session = state.relay.session();
    Json(QrResponse {
        status: session.status(),
        qr: session.pairing_code(),
    })
}

/// POST /send-text - Send a text message
#[utoipa::path(
    post,
    path = "/send-text",
    tag = "session",
    request_body = SendTextRequest,
    responses(
        (status = 200, description = "Message sent", body = SendResponse),
        (status = 400, description = "Invalid target", body = crate::error::ApiError),
        (status = 503, description = "Session not connected", body = crate::error::ApiError)
    )
)]
pub async fn send_text(
    State(state): State<AppState>,
    Json(request): Json<SendTextRequest>,
) -> Response {
    match state
        .relay
        .session()
        .send_text(&request.to, &request.text)
        .await
    {
        Ok(message_id) => Json(SendResponse { message_id }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /send-audio - Send an audio file as a voice note
#[utoipa::path(
    post,
    path = "/send-audio",
    tag = "session",
    request_body = SendAudioRequest,
    responses(
        (status = 200, description = "Voice note sent", body = SendResponse),
        (status = 400, description = "Invalid target or path", body = crate::error::ApiError),
        (status = 503, description = "Session not connected", body = crate::error::ApiError)
    )
)]
pub async fn send_audio(
    State(state): State<AppState>,
    Json(request): Json<SendAudioRequest>,
) -> Response {
    if request.path.as_os_str().is_empty() {
        return ApiError::validation("path is required").into_response();
    }

    match state
        .relay
        .session()
        .send_audio(&request.to, &request.path)
        .await
    {
        Ok(message_id) => Json(SendResponse { message_id }).into_response(),
        Err(e) => e.into_response(),
    }
}
