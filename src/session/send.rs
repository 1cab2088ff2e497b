//! Outbound messages, history and media access.

use super::SessionManager;
use super::traits::OutboundPayload;
use crate::error::{Error, Result};
use crate::types::{ChatId, MediaHandle, MessageId, RawMessage};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static FULL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z][0-9A-Za-z._:-]*@[0-9a-z][0-9a-z.-]*$").expect("valid pattern")
});

#[allow(clippy::expect_used)]
static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{7,15}$").expect("valid pattern"));

/// Normalize a caller-supplied target into an addressable chat id
///
/// Accepts either a full id (`4915112345678@s.whatsapp.net`, `1203630-16@g.us`)
/// or a phone number in international format, optionally written with `+`,
/// spaces, dashes or parentheses. Bare numbers get `user_server` appended.
///
/// # Examples
///
/// ```
/// use voicenote_dl::session::normalize_target;
///
/// let chat = normalize_target("+49 151-123 45678", "s.whatsapp.net").unwrap();
/// assert_eq!(chat.as_str(), "4915112345678@s.whatsapp.net");
/// assert!(normalize_target("hello", "s.whatsapp.net").is_err());
/// ```
pub fn normalize_target(target: &str, user_server: &str) -> Result<ChatId> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(Error::TargetInvalid("target is empty".to_string()));
    }

    if trimmed.contains('@') {
        let lowered = match trimmed.split_once('@') {
            Some((user, server)) => format!("{}@{}", user, server.to_ascii_lowercase()),
            None => trimmed.to_string(),
        };
        return if FULL_ID.is_match(&lowered) {
            Ok(ChatId::new(lowered))
        } else {
            Err(Error::TargetInvalid(trimmed.to_string()))
        };
    }

    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '-' | '(' | ')' | '.'))
        .collect();
    if PHONE_NUMBER.is_match(&digits) {
        Ok(ChatId::new(format!("{}@{}", digits, user_server)))
    } else {
        Err(Error::TargetInvalid(trimmed.to_string()))
    }
}

/// MIME type for a voice note file, from its extension
fn audio_mimetype(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("ogg") | Some("opus") | Some("oga") => "audio/ogg; codecs=opus",
        Some("mp3") => "audio/mpeg",
        Some("m4a") | Some("aac") => "audio/mp4",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

impl SessionManager {
    /// Send a text message
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the session is not connected
    /// - [`Error::TargetInvalid`] if `target` cannot be normalized
    pub async fn send_text(&self, target: &str, text: &str) -> Result<MessageId> {
        self.require_connected()?;
        let chat = normalize_target(target, &self.config.user_server)?;

        let id = self
            .session
            .send(&chat, OutboundPayload::Text(text.to_string()))
            .await?;
        tracing::info!(chat_id = %chat, message_id = %id, "Sent text message");
        Ok(id)
    }

    /// Send an audio file as a voice note
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the session is not connected
    /// - [`Error::TargetInvalid`] if `target` cannot be normalized
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::InvalidRequest`] if the file is empty
    pub async fn send_audio(&self, target: &str, path: &Path) -> Result<MessageId> {
        self.require_connected()?;
        let chat = normalize_target(target, &self.config.user_server)?;

        let data = tokio::fs::read(path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read audio file '{}': {}", path.display(), e),
            ))
        })?;
        if data.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "audio file '{}' is empty",
                path.display()
            )));
        }

        let size = data.len();
        let payload = OutboundPayload::Voice {
            data,
            mimetype: audio_mimetype(path).to_string(),
        };
        let id = self.session.send(&chat, payload).await?;
        tracing::info!(chat_id = %chat, message_id = %id, bytes = size, "Sent voice note");
        Ok(id)
    }

    /// Fetch up to `limit` recent messages across all chats
    pub async fn fetch_history(&self, limit: usize) -> Result<Vec<RawMessage>> {
        self.require_connected()?;
        let messages = self.session.fetch_history(limit).await?;
        tracing::debug!(limit, fetched = messages.len(), "Fetched message history");
        Ok(messages)
    }

    /// Download the media behind `handle`
    pub async fn download_media(&self, handle: &MediaHandle) -> Result<Vec<u8>> {
        self.require_connected()?;
        self.session.download_media(handle).await
    }
}
