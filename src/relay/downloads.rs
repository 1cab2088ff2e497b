//! Download entry points with request defaults applied.

use super::VoiceRelay;
use crate::error::{Error, Result};
use crate::session::normalize_target;
use crate::sink::{FileSink, MediaSink};
use crate::types::Progress;
use std::path::PathBuf;
use std::sync::Arc;

impl VoiceRelay {
    /// Start downloading the voice notes of one chat into `output_dir`
    ///
    /// `chat` accepts anything [`normalize_target`] does. `limit` and
    /// `output_dir` fall back to `retrieval.default_limit` and
    /// `retrieval.default_output_dir`.
    ///
    /// # Errors
    ///
    /// - [`Error::TargetInvalid`] if `chat` cannot be normalized
    /// - [`Error::InvalidRequest`] if `limit` is zero
    /// - [`Error::AlreadyInProgress`] if a job is running
    /// - [`Error::NotConnected`] if the session is not connected
    pub async fn download_voices(
        &self,
        chat: &str,
        limit: Option<usize>,
        output_dir: Option<PathBuf>,
    ) -> Result<Progress> {
        let chat_id = normalize_target(chat, &self.config.session.user_server)?;
        let limit = self.effective_limit(limit)?;
        let sink = self.file_sink(output_dir);

        self.retrieval.start_for_chat(chat_id, limit, sink).await
    }

    /// Start downloading the voice notes of every chat into `output_dir`
    ///
    /// # Errors
    ///
    /// Same as [`download_voices`](Self::download_voices), minus target validation.
    pub async fn download_voices_all(
        &self,
        limit: Option<usize>,
        output_dir: Option<PathBuf>,
    ) -> Result<Progress> {
        let limit = self.effective_limit(limit)?;
        let sink = self.file_sink(output_dir);

        self.retrieval.start_for_all_chats(limit, sink).await
    }

    fn effective_limit(&self, limit: Option<usize>) -> Result<usize> {
        match limit {
            Some(0) => Err(Error::InvalidRequest(
                "limit must be greater than 0".to_string(),
            )),
            Some(limit) => Ok(limit),
            None => Ok(self.config.retrieval.default_limit),
        }
    }

    fn file_sink(&self, output_dir: Option<PathBuf>) -> Arc<dyn MediaSink> {
        let root = output_dir.unwrap_or_else(|| self.config.retrieval.default_output_dir.clone());
        Arc::new(FileSink::new(root))
    }
}
