//! Job entry points and the background download loops.

use super::filter::{group_by_chat, select_voice_items};
use super::{JobHandle, RetrievalController};
use crate::error::{Error, Result};
use crate::pacing::{PacingPolicy, PacingRule};
use crate::sink::MediaSink;
use crate::types::{ChatId, Event, JobScope, Progress, VoiceItem};
use std::path::PathBuf;
use std::sync::Arc;

/// How a container loop ended
#[derive(Debug, PartialEq, Eq)]
enum LoopExit {
    /// Every item was attempted
    Done,
    /// The stop token fired
    Stopped,
}

fn item_error(item: &VoiceItem, reason: impl Into<String>) -> Error {
    Error::ItemDownload {
        message_id: item.message_id.0.clone(),
        reason: reason.into(),
    }
}

impl RetrievalController {
    /// Download the voice notes of one chat
    ///
    /// Fetches up to `limit` recent messages, keeps the voice notes of
    /// `chat_id` and hands them to a background task that stores them through
    /// `sink`, one at a time with pacing delays in between. Returns the
    /// progress snapshot right after selection (`total` is set).
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyInProgress`] if a job is running; its progress is untouched
    /// - [`Error::NotConnected`] or [`Error::Session`] if history cannot be fetched;
    ///   the slot returns to `idle`
    pub async fn start_for_chat(
        &self,
        chat_id: ChatId,
        limit: usize,
        sink: Arc<dyn MediaSink>,
    ) -> Result<Progress> {
        let job = self.begin(JobScope::Chat(chat_id.clone()))?;

        let history = match self.session.fetch_history(limit).await {
            Ok(history) => history,
            Err(e) => {
                self.abandon(&job);
                return Err(e);
            }
        };

        let items = select_voice_items(&history, Some(&chat_id), self.config.include_audio_files);
        let total = items.len() as u64;
        let snapshot = self.update(&job, |progress| progress.total = total);

        tracing::info!(
            job_id = job.id,
            chat_id = %chat_id,
            fetched = history.len(),
            total,
            sink = sink.name(),
            "Voice download job started"
        );
        let _ = self.event_tx.send(Event::JobStarted {
            scope: job.scope.clone(),
            total,
        });

        if items.is_empty() {
            self.complete(&job);
            return Ok(self.progress());
        }

        let controller = self.clone();
        let handle = tokio::spawn(async move {
            if controller.process_container(&job, &items, &sink).await == LoopExit::Stopped {
                controller.paused(&job);
            } else {
                controller.complete(&job);
            }
        });
        *self.worker.lock().await = Some(handle);

        Ok(snapshot.unwrap_or_else(|| self.progress()))
    }

    /// Download the voice notes of every chat in the history snapshot
    ///
    /// Chats are processed in order of first appearance. Chats without voice
    /// notes still count towards `totalChats`. Between chats the
    /// `between_chats` delay is applied.
    ///
    /// # Errors
    ///
    /// Same as [`start_for_chat`](Self::start_for_chat).
    pub async fn start_for_all_chats(
        &self,
        limit: usize,
        sink: Arc<dyn MediaSink>,
    ) -> Result<Progress> {
        let job = self.begin(JobScope::AllChats)?;

        let history = match self.session.fetch_history(limit).await {
            Ok(history) => history,
            Err(e) => {
                self.abandon(&job);
                return Err(e);
            }
        };

        let containers = group_by_chat(&history, self.config.include_audio_files);
        let total: u64 = containers.iter().map(|(_, items)| items.len() as u64).sum();
        let total_chats = containers.len() as u64;
        let snapshot = self.update(&job, |progress| {
            progress.total = total;
            progress.total_chats = total_chats;
        });

        tracing::info!(
            job_id = job.id,
            fetched = history.len(),
            total,
            total_chats,
            sink = sink.name(),
            "Voice download job started for all chats"
        );
        let _ = self.event_tx.send(Event::JobStarted {
            scope: job.scope.clone(),
            total,
        });

        if total == 0 {
            self.complete(&job);
            return Ok(self.progress());
        }

        let controller = self.clone();
        let handle = tokio::spawn(async move {
            if controller.process_all(&job, &containers, &sink).await == LoopExit::Stopped {
                controller.paused(&job);
            } else {
                controller.complete(&job);
            }
        });
        *self.worker.lock().await = Some(handle);

        Ok(snapshot.unwrap_or_else(|| self.progress()))
    }

    async fn process_all(
        &self,
        job: &JobHandle,
        containers: &[(ChatId, Vec<VoiceItem>)],
        sink: &Arc<dyn MediaSink>,
    ) -> LoopExit {
        for (position, (chat_id, items)) in containers.iter().enumerate() {
            if job.cancel.is_cancelled() {
                return LoopExit::Stopped;
            }

            self.update(job, |progress| progress.current_chat = Some(chat_id.clone()));
            tracing::debug!(job_id = job.id, chat_id = %chat_id, items = items.len(), "Processing chat");
            let _ = self.event_tx.send(Event::ChatStarted {
                chat_id: chat_id.clone(),
                items: items.len() as u64,
            });

            if self.process_container(job, items, sink).await == LoopExit::Stopped {
                return LoopExit::Stopped;
            }
            self.update(job, |progress| progress.processed_chats += 1);

            if position + 1 < containers.len() {
                self.pace(job, PacingRule::BetweenChats).await;
            }
        }
        LoopExit::Done
    }

    async fn process_container(
        &self,
        job: &JobHandle,
        items: &[VoiceItem],
        sink: &Arc<dyn MediaSink>,
    ) -> LoopExit {
        for (index, item) in items.iter().enumerate() {
            if job.cancel.is_cancelled() {
                return LoopExit::Stopped;
            }

            self.process_item(job, item, sink).await;

            if let Some(rule) = PacingPolicy::rule_for(index + 1, items.len()) {
                self.pace(job, rule).await;
            }
        }
        LoopExit::Done
    }

    async fn process_item(&self, job: &JobHandle, item: &VoiceItem, sink: &Arc<dyn MediaSink>) {
        match self.fetch_and_store(item, sink).await {
            Ok(path) => {
                if self
                    .update(job, |progress| progress.downloaded += 1)
                    .is_none()
                {
                    return;
                }
                tracing::debug!(
                    chat_id = %item.chat_id,
                    message_id = %item.message_id,
                    path = %path.display(),
                    "Voice note stored"
                );
                let _ = self.event_tx.send(Event::ItemDownloaded {
                    chat_id: item.chat_id.clone(),
                    message_id: item.message_id.clone(),
                    path,
                });
            }
            Err(e) => {
                if self.update(job, |progress| progress.failed += 1).is_none() {
                    return;
                }
                tracing::warn!(
                    chat_id = %item.chat_id,
                    message_id = %item.message_id,
                    error = %e,
                    "Voice note download failed"
                );
                let _ = self.event_tx.send(Event::ItemFailed {
                    chat_id: item.chat_id.clone(),
                    message_id: item.message_id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    async fn fetch_and_store(&self, item: &VoiceItem, sink: &Arc<dyn MediaSink>) -> Result<PathBuf> {
        let bytes = self
            .session
            .download_media(&item.handle)
            .await
            .map_err(|e| item_error(item, e.to_string()))?;
        if bytes.is_empty() {
            return Err(item_error(item, "empty media payload"));
        }
        sink.store(&bytes, &item.destination_hint())
            .await
            .map_err(|e| item_error(item, e.to_string()))
    }

    /// Sleep for a delay drawn from `rule`'s range; returns early on stop
    async fn pace(&self, job: &JobHandle, rule: PacingRule) {
        let delay = PacingPolicy::sample(self.pacing.range(rule));
        let _ = self.event_tx.send(Event::Pacing {
            rule,
            delay_ms: delay.as_millis() as u64,
        });
        tracing::trace!(job_id = job.id, ?rule, delay_ms = delay.as_millis() as u64, "Pacing");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = job.cancel.cancelled() => {}
        }
    }
}
