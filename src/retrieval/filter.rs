//! Voice item selection from a raw history snapshot.

use crate::types::{ChatId, Direction, MessageKind, RawMessage, VoiceItem};
use std::collections::{HashMap, HashSet};

/// Whether a raw message is a retrievable voice item
pub(crate) fn qualifies(message: &RawMessage, include_audio_files: bool) -> bool {
    let audio = match message.kind {
        MessageKind::Voice => true,
        MessageKind::Audio => include_audio_files,
        _ => false,
    };
    audio && message.media.is_some() && !message.chat_id.is_broadcast()
}

fn to_item(message: &RawMessage) -> Option<VoiceItem> {
    let handle = message.media.clone()?;
    Some(VoiceItem {
        chat_id: message.chat_id.clone(),
        message_id: message.id.clone(),
        timestamp: message.timestamp,
        direction: if message.from_me {
            Direction::Outbound
        } else {
            Direction::Inbound
        },
        handle,
    })
}

/// Voice items of `chat` (or of every chat when `None`), oldest first
///
/// Duplicate message ids within a chat are dropped; history sync can deliver
/// the same message twice.
pub(crate) fn select_voice_items(
    history: &[RawMessage],
    chat: Option<&ChatId>,
    include_audio_files: bool,
) -> Vec<VoiceItem> {
    let mut seen = HashSet::new();
    let mut items: Vec<VoiceItem> = history
        .iter()
        .filter(|message| chat.is_none_or(|chat| &message.chat_id == chat))
        .filter(|message| qualifies(message, include_audio_files))
        .filter(|message| seen.insert((message.chat_id.clone(), message.id.clone())))
        .filter_map(to_item)
        .collect();
    items.sort_by_key(|item| item.timestamp);
    items
}

/// Group a snapshot into per-chat containers
///
/// Every chat that appears in the snapshot gets a container, in order of
/// first appearance, even when none of its messages qualify. Broadcast and
/// status chats are skipped.
pub(crate) fn group_by_chat(
    history: &[RawMessage],
    include_audio_files: bool,
) -> Vec<(ChatId, Vec<VoiceItem>)> {
    let mut order: Vec<ChatId> = Vec::new();
    let mut index: HashMap<ChatId, usize> = HashMap::new();
    for message in history {
        if message.chat_id.is_broadcast() || index.contains_key(&message.chat_id) {
            continue;
        }
        index.insert(message.chat_id.clone(), order.len());
        order.push(message.chat_id.clone());
    }

    let mut containers: Vec<(ChatId, Vec<VoiceItem>)> =
        order.into_iter().map(|chat| (chat, Vec::new())).collect();
    for item in select_voice_items(history, None, include_audio_files) {
        if let Some(&slot) = index.get(&item.chat_id) {
            containers[slot].1.push(item);
        }
    }
    containers
}
