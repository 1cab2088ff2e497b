//! Waiting helpers for relay events

use std::time::Duration;
use tokio::sync::broadcast;
use voicenote_dl::{Event, Progress};

/// How a download job ended
#[derive(Debug)]
pub enum JobEnd {
    Completed(Progress),
    Paused(Progress),
    Timeout,
}

/// Wait for the running job to complete or pause
pub async fn wait_for_job_end(events: &mut broadcast::Receiver<Event>, timeout: Duration) -> JobEnd {
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(Event::JobCompleted { progress }) => return JobEnd::Completed(progress),
                Ok(Event::JobPaused { progress }) => return JobEnd::Paused(progress),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return JobEnd::Timeout,
            }
        }
    })
    .await;

    result.unwrap_or(JobEnd::Timeout)
}

/// Collect events until `stop` matches one (inclusive)
pub async fn collect_events_until<F>(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    stop: F,
) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut collected = Vec::new();
    let _ = tokio::time::timeout(timeout, async {
        while let Ok(event) = events.recv().await {
            let done = stop(&event);
            collected.push(event);
            if done {
                break;
            }
        }
    })
    .await;
    collected
}
