//! In-memory chat client and history builders

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use voicenote_dl::config::DelayRange;
use voicenote_dl::{
    ChatId, ChatSession, CloseReason, Config, ConnectionState, Error, MediaHandle, MessageId,
    MessageKind, OutboundPayload, RawMessage, Result, SessionEvent, VoiceRelay,
};

/// Chat client that opens immediately unless told otherwise
#[derive(Default)]
pub struct ScriptedClient {
    failures: Mutex<VecDeque<String>>,
    live: Mutex<Option<mpsc::Sender<SessionEvent>>>,
    history: Mutex<Vec<RawMessage>>,
    broken_media: Mutex<HashSet<String>>,
    sent: Mutex<Vec<(ChatId, OutboundPayload)>>,
    connects: AtomicUsize,
    history_calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `connect()` call fail
    pub fn fail_next_connect(&self, reason: &str) {
        self.failures.lock().unwrap().push_back(reason.to_string());
    }

    pub fn set_history(&self, history: Vec<RawMessage>) {
        *self.history.lock().unwrap() = history;
    }

    pub fn break_media(&self, message_id: &str) {
        self.broken_media
            .lock()
            .unwrap()
            .insert(format!("media-{message_id}"));
    }

    pub fn sent(&self) -> Vec<(ChatId, OutboundPayload)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    /// Close the live connection with `reason`
    pub async fn close(&self, reason: CloseReason) {
        let sender = self.live.lock().unwrap().take();
        sender
            .expect("no live connection")
            .send(SessionEvent::Closed(reason))
            .await
            .unwrap();
    }
}

#[async_trait]
impl ChatSession for ScriptedClient {
    async fn connect(&self) -> Result<mpsc::Receiver<SessionEvent>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(reason) = failure {
            return Err(Error::Session(reason));
        }

        let (tx, rx) = mpsc::channel(16);
        tx.send(SessionEvent::Open).await.unwrap();
        *self.live.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn fetch_history(&self, limit: usize) -> Result<Vec<RawMessage>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn send(&self, target: &ChatId, payload: OutboundPayload) -> Result<MessageId> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((target.clone(), payload));
        Ok(MessageId(format!("3EB0{:04}", sent.len())))
    }

    async fn download_media(&self, handle: &MediaHandle) -> Result<Vec<u8>> {
        if self.broken_media.lock().unwrap().contains(&handle.0) {
            return Err(Error::Session(format!("{} not found on server", handle.0)));
        }
        Ok(format!("OggS:{}", handle.0).into_bytes())
    }

    async fn disconnect(&self) -> Result<()> {
        self.live.lock().unwrap().take();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Voice note `id` in `chat`, sent at `timestamp`
pub fn voice_note(chat: &str, id: &str, timestamp: i64) -> RawMessage {
    RawMessage {
        id: MessageId::from(id),
        chat_id: ChatId::from(chat),
        timestamp,
        from_me: false,
        kind: MessageKind::Voice,
        media: Some(MediaHandle(format!("media-{id}"))),
    }
}

/// Plain text message
pub fn text_message(chat: &str, id: &str, timestamp: i64) -> RawMessage {
    RawMessage {
        id: MessageId::from(id),
        chat_id: ChatId::from(chat),
        timestamp,
        from_me: false,
        kind: MessageKind::Text,
        media: None,
    }
}

/// `count` voice notes in `chat` with ids `<prefix>-1..`
pub fn voice_notes(chat: &str, prefix: &str, count: usize) -> Vec<RawMessage> {
    (1..=count)
        .map(|n| voice_note(chat, &format!("{prefix}-{n}"), 1_700_000_000 + n as i64))
        .collect()
}

/// Default config with every pacing range set to zero
pub fn unpaced_config() -> Config {
    let mut config = Config::default();
    config.retrieval.pacing.base = DelayRange::zero();
    config.retrieval.pacing.micro_pause = DelayRange::zero();
    config.retrieval.pacing.long_break = DelayRange::zero();
    config.retrieval.pacing.between_chats = DelayRange::zero();
    config
}

/// Relay around a fresh client, started and connected
pub async fn connected_relay(config: Config) -> (VoiceRelay, Arc<ScriptedClient>) {
    let client = ScriptedClient::new();
    let relay = VoiceRelay::new(config, client.clone()).unwrap();
    relay.start().await;
    relay
        .session()
        .wait_for_state(ConnectionState::Connected, Duration::from_secs(5))
        .await
        .unwrap();
    (relay, client)
}
