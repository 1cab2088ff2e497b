//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`session`] - Connection status, pairing code, sending
//! - [`retrieval`] - Bulk voice note downloads
//! - [`system`] - Health, events, OpenAPI

use crate::types::{ConnectionState, MessageId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod retrieval;
mod session;
mod system;

pub use retrieval::*;
pub use session::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Response for GET /status
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Connection state
    pub status: ConnectionState,
    /// Reconnect attempts since the last successful connect
    pub reconnect_attempts: u32,
}

/// Response for GET /qr
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct QrResponse {
    /// Connection state
    pub status: ConnectionState,
    /// Pairing code to render as a QR code; null unless pairing
    pub qr: Option<String>,
}

/// Request body for POST /send-text
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SendTextRequest {
    /// Phone number or full chat id
    pub to: String,
    /// Message text
    pub text: String,
}

/// Request body for POST /send-audio
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SendAudioRequest {
    /// Phone number or full chat id
    pub to: String,
    /// Audio file on the relay host
    #[schema(value_type = String)]
    pub path: PathBuf,
}

/// Response for POST /send-text and POST /send-audio
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    /// Id assigned to the sent message
    pub message_id: MessageId,
}

/// Request body for POST /download-voices
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadVoicesRequest {
    /// Phone number or full chat id
    pub chat_id: String,
    /// How many recent messages to scan (default: `retrieval.default_limit`)
    pub limit: Option<usize>,
    /// Where to store files (default: `retrieval.default_output_dir`)
    #[schema(value_type = Option<String>)]
    pub output_dir: Option<PathBuf>,
}

/// Request body for POST /download-voices-all
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DownloadVoicesAllRequest {
    /// How many recent messages to scan (default: `retrieval.default_limit`)
    pub limit: Option<usize>,
    /// Where to store files (default: `retrieval.default_output_dir`)
    #[schema(value_type = Option<String>)]
    pub output_dir: Option<PathBuf>,
}
