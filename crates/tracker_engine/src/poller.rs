//! Cancellable fixed-delay polling of one job at a time.
use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracker_logging::{tracker_debug, tracker_info};

use crate::JobId;

/// A poll result together with the job it was requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged<T> {
    pub job_id: JobId,
    pub value: T,
}

struct ActivePoll {
    job_id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Runs `fetch` immediately and then every `interval` after the previous
/// fetch finished. At most one fetch is in flight.
///
/// After `stop()` returns no new fetch starts, and a fetch still in flight is
/// dropped unless it already finished. On a multi-threaded runtime one result
/// may still reach `deliver` concurrently with the stop; consumers drop such
/// late results by job id.
pub struct Poller {
    runtime: Handle,
    active: Option<ActivePoll>,
}

impl Poller {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            active: None,
        }
    }

    /// Start polling `job_id`, replacing any poll already running.
    pub fn start<F, Fut, T, D>(&mut self, job_id: JobId, interval: Duration, fetch: F, deliver: D)
    where
        F: Fn(JobId) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        D: Fn(Tagged<T>) + Send + 'static,
    {
        self.stop();
        tracker_info!("Polling job {} every {:?}", job_id, interval);

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let tag = job_id.clone();
        let task = self.runtime.spawn(async move {
            loop {
                let value = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    value = fetch(tag.clone()) => value,
                };
                if token.is_cancelled() {
                    break;
                }
                deliver(Tagged {
                    job_id: tag.clone(),
                    value,
                });
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracker_debug!("Poll loop for job {} exited", tag);
        });

        self.active = Some(ActivePoll {
            job_id,
            cancel,
            task,
        });
    }

    /// Stop polling. Idempotent.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            active.task.abort();
            tracker_info!("Stopped polling job {}", active.job_id);
        }
    }

    pub fn active_job(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.job_id.as_str())
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
