//! Error types for voicenote-dl
//!
//! This module provides:
//! - The crate-wide [`Error`] enum and [`Result`] alias
//! - HTTP status code mapping for API integration ([`ToHttpStatus`])
//! - Structured error responses with machine-readable codes ([`ApiError`])

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for voicenote-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for voicenote-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "reconnect.base_delay")
        key: Option<String>,
    },

    /// Operation requires a connected session
    #[error("chat session is not connected")]
    NotConnected,

    /// Send target could not be normalized to an addressable chat id
    #[error("invalid target: {0}")]
    TargetInvalid(String),

    /// Session was closed for a terminal reason and needs re-pairing
    #[error("session terminated: {reason}")]
    AuthTerminated {
        /// Close reason as reported by the session
        reason: String,
    },

    /// A bulk retrieval job is already running
    #[error("a download job is already in progress")]
    AlreadyInProgress,

    /// Error reported by the chat session implementation
    #[error("session error: {0}")]
    Session(String),

    /// Per-item download failure (transfer, empty payload, or persistence)
    #[error("item {message_id} failed: {reason}")]
    ItemDownload {
        /// Message id of the failed item
        message_id: String,
        /// What went wrong
        reason: String,
    },

    /// Media sink rejected or failed to write a file
    #[error("failed to store {path}: {reason}")]
    Sink {
        /// Destination the sink was asked to write
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Waited too long for the session to reach a state
    #[error("timed out after {elapsed_ms}ms waiting for session state {target}")]
    Timeout {
        /// State that was awaited
        target: String,
        /// How long the caller waited
        elapsed_ms: u64,
    },

    /// Malformed request from the caller
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "already_in_progress",
///     "message": "a download job is already in progress"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_connected", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::TargetInvalid(_) => 400,
            Error::InvalidRequest(_) => 400,

            Error::AlreadyInProgress => 409,

            Error::Session(_) => 502,

            Error::NotConnected => 503,
            Error::AuthTerminated { .. } => 503,

            Error::Timeout { .. } => 504,

            Error::ItemDownload { .. }
            | Error::Sink { .. }
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::ApiServerError(_)
            | Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::NotConnected => "not_connected",
            Error::TargetInvalid(_) => "target_invalid",
            Error::AuthTerminated { .. } => "auth_terminated",
            Error::AlreadyInProgress => "already_in_progress",
            Error::Session(_) => "session_error",
            Error::ItemDownload { .. } => "item_download_failed",
            Error::Sink { .. } => "sink_error",
            Error::Timeout { .. } => "timeout",
            Error::InvalidRequest(_) => "validation_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::TargetInvalid(target) => Some(serde_json::json!({ "target": target })),
            Error::AuthTerminated { reason } => Some(serde_json::json!({ "reason": reason })),
            Error::ItemDownload { message_id, .. } => {
                Some(serde_json::json!({ "message_id": message_id }))
            }
            Error::Sink { path, .. } => {
                Some(serde_json::json!({ "path": path.display().to_string() }))
            }
            _ => None,
        };

        match details {
            Some(details) => ApiError::with_details(code, message, details),
            None => ApiError::new(code, message),
        }
    }
}
