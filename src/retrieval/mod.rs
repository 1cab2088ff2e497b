//! Bulk retrieval controller: paced, stoppable voice note download jobs.
//!
//! - [`filter`] - Voice item selection and per-chat grouping
//! - [`job`] - Job entry points and the background download loops
//!
//! At most one job runs at a time. The job slot (progress record, job id and
//! stop token) sits behind one mutex so the start guard is a single
//! check-and-set, and pollers always read a consistent snapshot. The lock is
//! never held across an await.

mod filter;
mod job;


use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::pacing::PacingPolicy;
use crate::session::SessionManager;
use crate::types::{Event, JobScope, JobStatus, Progress};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// The single job slot
#[derive(Debug, Default)]
pub(crate) struct JobSlot {
    /// Incremented for every accepted job; stale writers compare against it
    pub(crate) job_id: u64,
    /// What pollers see
    pub(crate) progress: Progress,
    /// Stop signal for the current job
    pub(crate) cancel: CancellationToken,
}

/// Handle a running job keeps to address its own slot
#[derive(Clone, Debug)]
pub(crate) struct JobHandle {
    pub(crate) id: u64,
    pub(crate) scope: JobScope,
    pub(crate) cancel: CancellationToken,
}

/// Drives bulk voice note downloads (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct RetrievalController {
    /// Session used for history and media
    pub(crate) session: SessionManager,
    /// Delay ranges between items and chats
    pub(crate) pacing: Arc<PacingPolicy>,
    /// Retrieval settings
    pub(crate) config: Arc<RetrievalConfig>,
    /// Relay-wide event channel
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Progress, job id and stop token of the current job
    pub(crate) slot: Arc<Mutex<JobSlot>>,
    /// Background task of the most recent job
    pub(crate) worker: Arc<tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl RetrievalController {
    /// Create a controller bound to a session manager
    pub fn new(
        session: SessionManager,
        config: RetrievalConfig,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            session,
            pacing: Arc::new(PacingPolicy::new(config.pacing.clone())),
            config: Arc::new(config),
            event_tx,
            slot: Arc::new(Mutex::new(JobSlot::default())),
            worker: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, JobSlot> {
        // Critical sections never panic midway, so a poisoned slot is still consistent
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the current (or last) job's progress
    pub fn progress(&self) -> Progress {
        self.lock_slot().progress.clone()
    }

    /// Ask the running job to stop
    ///
    /// Sets the status to `paused` if a job is running; otherwise does nothing.
    /// The job finishes the transfer in flight and stops before the next item
    /// or chat. There is no resume; start a new job instead.
    pub fn stop(&self) -> Progress {
        let mut slot = self.lock_slot();
        if slot.progress.status == JobStatus::Running {
            slot.progress.status = JobStatus::Paused;
            slot.cancel.cancel();
            tracing::info!(
                job_id = slot.job_id,
                downloaded = slot.progress.downloaded,
                failed = slot.progress.failed,
                total = slot.progress.total,
                "Download job stop requested"
            );
        }
        slot.progress.clone()
    }

    /// Claim the job slot, or fail if a job is running
    pub(crate) fn begin(&self, scope: JobScope) -> Result<JobHandle> {
        let mut slot = self.lock_slot();
        if slot.progress.status == JobStatus::Running {
            return Err(Error::AlreadyInProgress);
        }

        slot.job_id += 1;
        slot.progress = Progress::running();
        slot.cancel = CancellationToken::new();

        Ok(JobHandle {
            id: slot.job_id,
            scope,
            cancel: slot.cancel.clone(),
        })
    }

    /// Apply `update` if `job` still owns the slot; returns the resulting snapshot
    pub(crate) fn update<F>(&self, job: &JobHandle, update: F) -> Option<Progress>
    where
        F: FnOnce(&mut Progress),
    {
        let mut slot = self.lock_slot();
        if slot.job_id != job.id {
            return None;
        }
        update(&mut slot.progress);
        Some(slot.progress.clone())
    }

    /// Release the slot after a start that failed before any item was selected
    pub(crate) fn abandon(&self, job: &JobHandle) {
        self.update(job, |progress| *progress = Progress::default());
    }

    /// Mark the job completed unless it was stopped meanwhile
    pub(crate) fn complete(&self, job: &JobHandle) {
        let snapshot = self.update(job, |progress| {
            if progress.status == JobStatus::Running {
                progress.status = JobStatus::Completed;
                if matches!(job.scope, JobScope::AllChats) {
                    progress.processed_chats = progress.total_chats;
                }
            }
        });

        let Some(progress) = snapshot else {
            return;
        };
        if progress.status == JobStatus::Completed {
            tracing::info!(
                job_id = job.id,
                total = progress.total,
                downloaded = progress.downloaded,
                failed = progress.failed,
                "Download job completed"
            );
            let _ = self.event_tx.send(Event::JobCompleted { progress });
        } else {
            self.paused(job);
        }
    }

    /// Report that the loop observed a stop request
    pub(crate) fn paused(&self, job: &JobHandle) {
        let Some(progress) = self.update(job, |_| {}) else {
            return;
        };
        tracing::info!(
            job_id = job.id,
            downloaded = progress.downloaded,
            failed = progress.failed,
            total = progress.total,
            "Download job paused"
        );
        let _ = self.event_tx.send(Event::JobPaused { progress });
    }

    /// Stop the current job and wait for its task to exit
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "Download job task ended abnormally");
        }
    }
}
