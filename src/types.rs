//! Core types for voicenote-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

use crate::pacing::PacingRule;

/// Server suffix used by group chats
pub const GROUP_SERVER: &str = "g.us";

/// Server suffix used by broadcast lists and status updates
pub const BROADCAST_SERVER: &str = "broadcast";

/// Normalized, addressable chat identifier (`<user>@<server>`)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    /// Create a ChatId from an already-normalized identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `@` (phone number or group id)
    pub fn user(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(user, _)| user)
    }

    /// The part after `@`, if any
    pub fn server(&self) -> Option<&str> {
        self.0.split_once('@').map(|(_, server)| server)
    }

    /// Whether this chat is a group
    pub fn is_group(&self) -> bool {
        self.server() == Some(GROUP_SERVER)
    }

    /// Whether this chat is a broadcast list or the status feed
    pub fn is_broadcast(&self) -> bool {
        self.server() == Some(BROADCAST_SERVER)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChatId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier assigned to a message by the chat service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Opaque handle the chat session understands for fetching media bytes
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct MediaHandle(pub String);

/// Connection state of the chat session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and none being attempted right now
    #[default]
    Disconnected,
    /// Connection attempt in flight
    Connecting,
    /// Waiting for the operator to scan the pairing code
    QrPending,
    /// Authenticated and ready
    Connected,
}

impl ConnectionState {
    /// Lowercase name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::QrPending => "qr_pending",
            ConnectionState::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message type discriminator reported by the chat session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text
    Text,
    /// Push-to-talk voice note
    Voice,
    /// Audio file attachment (not recorded as a voice note)
    Audio,
    /// Image attachment
    Image,
    /// Video attachment
    Video,
    /// Document attachment
    Document,
    /// Anything else (reactions, stickers, protocol messages)
    Other,
}

/// A message as delivered by history sync or the live inbound stream
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RawMessage {
    /// Message id
    pub id: MessageId,
    /// Chat the message belongs to
    pub chat_id: ChatId,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Whether this account sent the message
    pub from_me: bool,
    /// Type discriminator
    pub kind: MessageKind,
    /// Handle for fetching attached media, if any
    pub media: Option<MediaHandle>,
}

/// Direction of a message relative to this account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Received from someone else
    Inbound,
    /// Sent by this account
    Outbound,
}

impl Direction {
    /// Lowercase name used in file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// One retrievable voice message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VoiceItem {
    /// Chat the message belongs to
    pub chat_id: ChatId,
    /// Message id
    pub message_id: MessageId,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Inbound or outbound
    pub direction: Direction,
    /// Handle for fetching the audio bytes
    pub handle: MediaHandle,
}

impl VoiceItem {
    /// Default destination hint: `<chat user>/<timestamp>_<direction>_<message id>.ogg`
    ///
    /// Characters outside `[A-Za-z0-9_-]` are replaced so the hint is always a
    /// plain relative path.
    pub fn destination_hint(&self) -> PathBuf {
        let folder = sanitize_component(self.chat_id.user());
        let file = format!(
            "{}_{}_{}.ogg",
            self.timestamp,
            self.direction.as_str(),
            sanitize_component(&self.message_id.0)
        );
        PathBuf::from(folder).join(file)
    }
}

fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Status of the bulk retrieval job
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// No job has run yet
    #[default]
    Idle,
    /// A job is iterating items
    Running,
    /// Stopped by request; not resumable
    Paused,
    /// All items processed (or nothing to process)
    Completed,
}

/// Scope of a bulk retrieval job
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "type", content = "chat_id")]
pub enum JobScope {
    /// A single chat
    Chat(ChatId),
    /// Every chat present in the history snapshot
    AllChats,
}

/// Progress of the bulk retrieval job, as seen by pollers
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Number of voice items selected for the job
    pub total: u64,
    /// Items stored successfully
    pub downloaded: u64,
    /// Items that failed to transfer or store
    pub failed: u64,
    /// Job status
    pub status: JobStatus,
    /// Chat currently being processed (all-chats scope only)
    pub current_chat: Option<ChatId>,
    /// Number of chats in the job (all-chats scope only)
    pub total_chats: u64,
    /// Number of chats finished so far (all-chats scope only)
    pub processed_chats: u64,
}

impl Progress {
    /// Fresh running record
    pub fn running() -> Self {
        Self {
            status: JobStatus::Running,
            ..Default::default()
        }
    }
}

/// Events emitted by the relay
///
/// Subscribers receive every event through a broadcast channel; the REST layer
/// forwards them as server-sent events.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Session connection state changed
    ConnectionChanged {
        /// New state
        state: ConnectionState,
    },

    /// A new pairing code must be scanned
    PairingCode {
        /// Code/QR payload
        code: String,
    },

    /// Session closed unexpectedly and a reconnect is scheduled
    Reconnecting {
        /// Attempt number (1-based)
        attempt: u32,
        /// Delay before the attempt in milliseconds
        delay_ms: u64,
        /// Close reason as reported
        reason: String,
    },

    /// Session closed for a terminal reason; re-pairing required
    AuthTerminated {
        /// Close reason as reported
        reason: String,
    },

    /// Inbound message observed on the live stream
    MessageReceived {
        /// Chat the message arrived in
        chat_id: ChatId,
        /// Message id
        message_id: MessageId,
        /// Type discriminator
        kind: MessageKind,
    },

    /// Bulk job accepted
    JobStarted {
        /// Job scope
        scope: JobScope,
        /// Number of voice items selected
        total: u64,
    },

    /// All-chats job moved on to a chat
    ChatStarted {
        /// Chat being processed
        chat_id: ChatId,
        /// Number of voice items in this chat
        items: u64,
    },

    /// Voice item stored
    ItemDownloaded {
        /// Chat the item belongs to
        chat_id: ChatId,
        /// Message id
        message_id: MessageId,
        /// Where the sink stored it
        #[schema(value_type = String)]
        path: PathBuf,
    },

    /// Voice item failed
    ItemFailed {
        /// Chat the item belongs to
        chat_id: ChatId,
        /// Message id
        message_id: MessageId,
        /// Failure description
        error: String,
    },

    /// Pacing delay applied
    Pacing {
        /// Rule that selected the delay range
        rule: PacingRule,
        /// Realized delay in milliseconds
        delay_ms: u64,
    },

    /// Job stopped by request
    JobPaused {
        /// Progress at the time the loop observed the stop
        progress: Progress,
    },

    /// Job finished
    JobCompleted {
        /// Final progress
        progress: Progress,
    },

    /// Relay shutting down
    Shutdown,
}

impl Event {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Event::ConnectionChanged { .. } => "connection_changed",
            Event::PairingCode { .. } => "pairing_code",
            Event::Reconnecting { .. } => "reconnecting",
            Event::AuthTerminated { .. } => "auth_terminated",
            Event::MessageReceived { .. } => "message_received",
            Event::JobStarted { .. } => "job_started",
            Event::ChatStarted { .. } => "chat_started",
            Event::ItemDownloaded { .. } => "item_downloaded",
            Event::ItemFailed { .. } => "item_failed",
            Event::Pacing { .. } => "pacing",
            Event::JobPaused { .. } => "job_paused",
            Event::JobCompleted { .. } => "job_completed",
            Event::Shutdown => "shutdown",
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_parts() {
        let chat = ChatId::from("4915112345678@s.whatsapp.net");
        assert_eq!(chat.user(), "4915112345678");
        assert_eq!(chat.server(), Some("s.whatsapp.net"));
        assert!(!chat.is_group());
        assert!(!chat.is_broadcast());

        assert!(ChatId::from("1203630@g.us").is_group());
        assert!(ChatId::from("status@broadcast").is_broadcast());
    }

    #[test]
    fn progress_serializes_with_camel_case_fields() {
        let progress = Progress {
            total: 3,
            downloaded: 1,
            failed: 1,
            status: JobStatus::Running,
            current_chat: Some(ChatId::from("1@s.whatsapp.net")),
            total_chats: 2,
            processed_chats: 1,
        };
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["currentChat"], "1@s.whatsapp.net");
        assert_eq!(json["totalChats"], 2);
        assert_eq!(json["processedChats"], 1);
    }

    #[test]
    fn connection_state_wire_names() {
        let json = serde_json::to_string(&ConnectionState::QrPending).unwrap();
        assert_eq!(json, "\"qr_pending\"");
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
    }

    #[test]
    fn destination_hint_is_relative_and_sanitized() {
        let item = VoiceItem {
            chat_id: ChatId::from("4915112345678@s.whatsapp.net"),
            message_id: MessageId::from("3EB0/../ABC"),
            timestamp: 1_700_000_000,
            direction: Direction::Outbound,
            handle: MediaHandle("h".into()),
        };
        let hint = item.destination_hint();
        assert!(hint.is_relative());
        assert_eq!(
            hint,
            PathBuf::from("4915112345678").join("1700000000_outbound_3EB0____ABC.ogg")
        );
    }
}
