//! Media sink: where downloaded voice notes end up
//!
//! The retrieval controller hands every payload to a [`MediaSink`] together
//! with a relative destination hint. [`FileSink`] writes them below a root
//! directory; other implementations (object storage, in-memory capture) only
//! need to honor the same contract.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Trait for persisting downloaded media
#[async_trait]
pub trait MediaSink: Send + Sync {
    /// Store `bytes` at a location derived from `hint`, returning where it went
    ///
    /// # Errors
    ///
    /// Returns an error if the hint is not acceptable or the write fails. The
    /// retrieval controller counts such errors as item failures.
    async fn store(&self, bytes: &[u8], hint: &Path) -> Result<PathBuf>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Sink writing files below a root directory
#[derive(Clone, Debug)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    /// Create a sink rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, hint: &Path) -> Result<PathBuf> {
        let plain = hint
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if hint.as_os_str().is_empty() || !plain {
            return Err(Error::Sink {
                path: hint.to_path_buf(),
                reason: "destination must be a plain relative path".to_string(),
            });
        }
        Ok(self.root.join(hint))
    }
}

#[async_trait]
impl MediaSink for FileSink {
    async fn store(&self, bytes: &[u8], hint: &Path) -> Result<PathBuf> {
        let destination = self.resolve(hint)?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Sink {
                    path: destination.clone(),
                    reason: format!("failed to create directory '{}': {}", parent.display(), e),
                })?;
        }

        tokio::fs::write(&destination, bytes)
            .await
            .map_err(|e| Error::Sink {
                path: destination.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            path = %destination.display(),
            bytes = bytes.len(),
            "Stored media"
        );

        Ok(destination)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_below_root_and_creates_directories() {
        let temp = tempdir().unwrap();
        let sink = FileSink::new(temp.path().join("voices"));

        let path = sink
            .store(b"OggS", Path::new("4915112345678/1700000000_inbound_ABC.ogg"))
            .await
            .unwrap();

        assert!(path.starts_with(temp.path().join("voices")));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"OggS");
    }

    #[tokio::test]
    async fn rejects_escaping_hints() {
        let temp = tempdir().unwrap();
        let sink = FileSink::new(temp.path());

        for hint in ["../outside.ogg", "/etc/passwd", "a/../../b.ogg", ""] {
            let err = sink.store(b"x", Path::new(hint)).await.unwrap_err();
            assert!(matches!(err, Error::Sink { .. }), "hint {hint:?}");
        }
    }

    #[tokio::test]
    async fn write_failure_is_a_sink_error() {
        let temp = tempdir().unwrap();
        // A file where the sink expects a directory
        let blocker = temp.path().join("chat");
        tokio::fs::write(&blocker, b"not a dir").await.unwrap();
        let sink = FileSink::new(temp.path());

        let err = sink
            .store(b"x", Path::new("chat/voice.ogg"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sink { .. }));
    }
}
