//! Shared test doubles: a scripted chat session and a recording media sink.

use crate::config::{Config, PacingConfig};
use crate::error::{Error, Result};
use crate::session::{ChatSession, OutboundPayload, SessionEvent};
use crate::sink::MediaSink;
use crate::types::{ChatId, ConnectionState, MediaHandle, MessageId, MessageKind, RawMessage};
use crate::VoiceRelay;
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// What one `connect()` call does
#[derive(Clone, Debug)]
pub(crate) enum ConnectScript {
    /// `connect()` returns an error
    Fail(String),
    /// `connect()` succeeds and these events are queued on the new connection
    Events(Vec<SessionEvent>),
}

/// In-memory chat session driven by scripts
#[derive(Default)]
pub(crate) struct FakeSession {
    scripts: Mutex<VecDeque<ConnectScript>>,
    live: Mutex<Option<mpsc::Sender<SessionEvent>>>,
    history: Mutex<Vec<RawMessage>>,
    failing_media: Mutex<HashSet<String>>,
    empty_media: Mutex<HashSet<String>>,
    sent: Mutex<Vec<(ChatId, OutboundPayload)>>,
    media_delay: Mutex<Option<Duration>>,
    pub(crate) connect_calls: AtomicUsize,
    pub(crate) history_calls: AtomicUsize,
    pub(crate) download_calls: AtomicUsize,
}

impl FakeSession {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the behavior of the next `connect()` call. Unscripted calls just open.
    pub(crate) fn script(&self, script: ConnectScript) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub(crate) fn set_history(&self, messages: Vec<RawMessage>) {
        *self.history.lock().unwrap() = messages;
    }

    pub(crate) fn fail_media(&self, handle: &str) {
        self.failing_media.lock().unwrap().insert(handle.to_string());
    }

    pub(crate) fn empty_media(&self, handle: &str) {
        self.empty_media.lock().unwrap().insert(handle.to_string());
    }

    /// Every media download takes this long (virtual time in paused tests)
    pub(crate) fn set_media_delay(&self, delay: Duration) {
        *self.media_delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn sent(&self) -> Vec<(ChatId, OutboundPayload)> {
        self.sent.lock().unwrap().clone()
    }

    /// Drop the live connection's sender without a close event
    pub(crate) fn drop_connection(&self) {
        self.live.lock().unwrap().take();
    }

    /// Push an event on the live connection
    pub(crate) async fn push(&self, event: SessionEvent) {
        let sender = self.live.lock().unwrap().clone();
        sender
            .expect("no live connection")
            .send(event)
            .await
            .expect("connection receiver dropped");
    }
}

#[async_trait]
impl ChatSession for FakeSession {
    async fn connect(&self) -> Result<mpsc::Receiver<SessionEvent>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectScript::Events(vec![SessionEvent::Open]));

        match script {
            ConnectScript::Fail(msg) => Err(Error::Session(msg)),
            ConnectScript::Events(events) => {
                let (tx, rx) = mpsc::channel(64);
                for event in events {
                    tx.send(event).await.expect("receiver alive");
                }
                *self.live.lock().unwrap() = Some(tx);
                Ok(rx)
            }
        }
    }

    async fn fetch_history(&self, limit: usize) -> Result<Vec<RawMessage>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let history = self.history.lock().unwrap();
        Ok(history.iter().take(limit).cloned().collect())
    }

    async fn send(&self, target: &ChatId, payload: OutboundPayload) -> Result<MessageId> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((target.clone(), payload));
        Ok(MessageId(format!("SENT{}", sent.len())))
    }

    async fn download_media(&self, handle: &MediaHandle) -> Result<Vec<u8>> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.media_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_media.lock().unwrap().contains(&handle.0) {
            return Err(Error::Session(format!("media {} expired", handle.0)));
        }
        if self.empty_media.lock().unwrap().contains(&handle.0) {
            return Ok(Vec::new());
        }
        Ok(handle.0.as_bytes().to_vec())
    }

    async fn disconnect(&self) -> Result<()> {
        let sender = self.live.lock().unwrap().take();
        if let Some(sender) = sender {
            let _ = sender
                .send(SessionEvent::Closed(crate::session::CloseReason::ConnectionClosed))
                .await;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Sink that keeps stored payloads in memory
#[derive(Default)]
pub(crate) struct RecordingSink {
    stored: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    failing: Mutex<HashSet<PathBuf>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_on(&self, hint: impl Into<PathBuf>) {
        self.failing.lock().unwrap().insert(hint.into());
    }

    pub(crate) fn stored(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaSink for RecordingSink {
    async fn store(&self, bytes: &[u8], hint: &Path) -> Result<PathBuf> {
        if self.failing.lock().unwrap().contains(hint) {
            return Err(Error::Sink {
                path: hint.to_path_buf(),
                reason: "disk full".to_string(),
            });
        }
        self.stored
            .lock()
            .unwrap()
            .push((hint.to_path_buf(), bytes.to_vec()));
        Ok(PathBuf::from("/memory").join(hint))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Voice note `id` in `chat` with media handle `h-<id>`
pub(crate) fn voice(chat: &str, id: &str, timestamp: i64) -> RawMessage {
    RawMessage {
        id: MessageId::from(id),
        chat_id: ChatId::from(chat),
        timestamp,
        from_me: false,
        kind: MessageKind::Voice,
        media: Some(MediaHandle(format!("h-{id}"))),
    }
}

/// Text message `id` in `chat`
pub(crate) fn text(chat: &str, id: &str, timestamp: i64) -> RawMessage {
    RawMessage {
        id: MessageId::from(id),
        chat_id: ChatId::from(chat),
        timestamp,
        from_me: false,
        kind: MessageKind::Text,
        media: None,
    }
}

/// `count` voice notes in `chat`, ids `<prefix>1..=<prefix>count`, oldest first
pub(crate) fn voices(chat: &str, prefix: &str, count: usize) -> Vec<RawMessage> {
    (1..=count)
        .map(|n| voice(chat, &format!("{prefix}{n}"), 1_700_000_000 + n as i64))
        .collect()
}

/// Config with zero pacing so tests run without virtual time
pub(crate) fn instant_config() -> Config {
    let mut config = Config::default();
    config.retrieval.pacing = PacingConfig {
        base: crate::config::DelayRange::zero(),
        micro_pause: crate::config::DelayRange::zero(),
        long_break: crate::config::DelayRange::zero(),
        between_chats: crate::config::DelayRange::zero(),
    };
    config
}

/// Relay around a fake session, started and connected
pub(crate) async fn connected_relay(config: Config) -> (VoiceRelay, Arc<FakeSession>) {
    let session = FakeSession::new();
    let relay = VoiceRelay::new(config, session.clone()).expect("valid config");
    relay.session().start().await;
    relay
        .session()
        .wait_for_state(ConnectionState::Connected, Duration::from_secs(5))
        .await
        .expect("fake session connects");
    (relay, session)
}
