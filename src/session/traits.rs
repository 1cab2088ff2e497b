//! Seam between the session manager and a concrete chat protocol client

use crate::error::Result;
use crate::types::{ChatId, MediaHandle, MessageId, RawMessage};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Why a session closed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// The account was logged out from the phone or another device
    LoggedOut,
    /// Stored credentials were rejected by the service
    CredentialsRevoked,
    /// Transport dropped
    ConnectionLost,
    /// Server closed the stream
    ConnectionClosed,
    /// Keepalive or handshake timed out
    TimedOut,
    /// Server asked the client to reconnect
    RestartRequired,
    /// `connect()` itself returned an error
    ConnectFailed(String),
    /// Any other reason reported by the client
    Other(String),
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::LoggedOut => f.write_str("logged out"),
            CloseReason::CredentialsRevoked => f.write_str("credentials revoked"),
            CloseReason::ConnectionLost => f.write_str("connection lost"),
            CloseReason::ConnectionClosed => f.write_str("connection closed"),
            CloseReason::TimedOut => f.write_str("timed out"),
            CloseReason::RestartRequired => f.write_str("restart required"),
            CloseReason::ConnectFailed(msg) => write!(f, "connect failed: {msg}"),
            CloseReason::Other(msg) => f.write_str(msg),
        }
    }
}

/// Lifecycle and traffic notifications produced by a live connection
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// No usable credentials; the operator must scan this code
    PairingCode(String),
    /// Authenticated and ready for traffic
    Open,
    /// Live inbound message
    Message(RawMessage),
    /// Connection closed; no further events follow
    Closed(CloseReason),
}

/// Outgoing message content
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundPayload {
    /// Plain text
    Text(String),
    /// Voice note
    Voice {
        /// Encoded audio
        data: Vec<u8>,
        /// MIME type of `data`
        mimetype: String,
    },
}

/// An authenticated chat-protocol client
///
/// Implementations own framing, encryption and credential storage. The
/// session manager drives them through this interface only and never calls
/// `connect()` while a previous connection is still live.
#[async_trait]
pub trait ChatSession: Send + Sync {
    /// Open a connection using persisted credentials when present
    ///
    /// The returned channel carries lifecycle events for this connection.
    /// It ends with [`SessionEvent::Closed`] or by the sender being dropped,
    /// which the manager treats as a lost connection.
    async fn connect(&self) -> Result<mpsc::Receiver<SessionEvent>>;

    /// Most recent `limit` messages known to the client, across all chats
    async fn fetch_history(&self, limit: usize) -> Result<Vec<RawMessage>>;

    /// Send a message and return the id assigned to it
    async fn send(&self, target: &ChatId, payload: OutboundPayload) -> Result<MessageId>;

    /// Download and decrypt the media behind `handle`
    async fn download_media(&self, handle: &MediaHandle) -> Result<Vec<u8>>;

    /// Close the current connection without logging out
    async fn disconnect(&self) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
