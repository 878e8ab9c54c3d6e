use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::estimate::sanitize_remaining;
use crate::{
    assemble, estimate, reconcile, ControllerState, Effect, ExportState, JobId, JobSnapshot, Msg,
    PollErrorKind, RemoteJobStatus, SubmitRequest, TrackerError, TrackerState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested(request) => start(&mut state, request),
        Msg::SubmissionSucceeded { ticket, job_id } => {
            if !state.is_pending_submission(ticket) {
                tracker_debug!("Discarding stale submission result ticket={}", ticket);
                return (state, Vec::new());
            }
            tracker_info!("Submission accepted, tracking job {}", job_id);
            state.begin_tracking(job_id.clone());
            vec![Effect::StartPolling {
                job_id,
                interval: state.settings().poll_interval,
            }]
        }
        Msg::SubmissionFailed { ticket, message } => {
            if !state.is_pending_submission(ticket) {
                tracker_debug!("Discarding stale submission failure ticket={}", ticket);
                return (state, Vec::new());
            }
            tracker_warn!("Submission failed: {}", message);
            state.abandon_submission(TrackerError::Submission(message));
            Vec::new()
        }
        Msg::SnapshotReceived { job_id, snapshot } => apply_snapshot(&mut state, &job_id, snapshot),
        Msg::PollFailed {
            job_id,
            kind,
            message,
        } => {
            if !state.is_tracking(&job_id) {
                tracker_debug!("Discarding poll failure for inactive job {}", job_id);
                return (state, Vec::new());
            }
            let registered = state.job().is_some_and(|job| job.is_registered());
            if kind == PollErrorKind::NotFound && !registered {
                // The server registers a job only after splitting the document.
                tracker_info!("Job {} not registered on the server yet: {}", job_id, message);
                return (state, Vec::new());
            }
            let attempts = state.record_poll_error();
            let tolerance = state.settings().max_consecutive_poll_errors;
            tracker_warn!(
                "Poll for job {} failed ({}/{}): {}",
                job_id,
                attempts,
                tolerance,
                message
            );
            if tolerance > 0 && attempts >= tolerance {
                state.fail(TrackerError::PollAbandoned {
                    attempts,
                    last_error: message,
                });
                vec![Effect::StopPolling]
            } else {
                Vec::new()
            }
        }
        Msg::ExportFinished { job_id, result } => {
            if !state.is_completed_job(&job_id) {
                tracker_debug!("Discarding export result for inactive job {}", job_id);
                return (state, Vec::new());
            }
            match result {
                Ok(paths) => state.set_export(ExportState::Written(paths)),
                Err(message) => {
                    tracker_warn!("Export for job {} failed: {}", job_id, message);
                    state.set_export(ExportState::Failed(message));
                }
            }
            Vec::new()
        }
        Msg::ResetRequested => {
            let had_job = state.job().is_some();
            state.reset();
            if had_job {
                tracker_info!("Job discarded; tracker is idle");
                vec![Effect::StopPolling]
            } else {
                Vec::new()
            }
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start(state: &mut TrackerState, request: SubmitRequest) -> Vec<Effect> {
    if state.controller_state() != ControllerState::Idle {
        tracker_debug!(
            "Ignoring start request in state {:?}",
            state.controller_state()
        );
        return Vec::new();
    }
    match request.validate() {
        Ok(submission) => {
            let ticket = state.begin_submission(submission.source.clone());
            tracker_info!(
                "Submitting {:?} ({} pages per chunk) ticket={}",
                submission.source,
                submission.pages_per_chunk,
                ticket
            );
            vec![Effect::Submit { ticket, submission }]
        }
        Err(err) => {
            tracker_warn!("Start request rejected: {}", err);
            state.set_validation_error(err);
            Vec::new()
        }
    }
}

fn apply_snapshot(state: &mut TrackerState, job_id: &JobId, snapshot: JobSnapshot) -> Vec<Effect> {
    if !state.is_tracking(job_id) {
        // Late response for a stopped, reset or replaced job.
        tracker_debug!("Stale snapshot for job {} ignored", job_id);
        return Vec::new();
    }
    state.record_poll_success();

    let progress = estimate(snapshot.progress, snapshot.remaining_time);
    let Some(job) = state.job_mut() else {
        return Vec::new();
    };
    let report = reconcile(job.chunks_mut(), &snapshot.chunks);
    let metrics_changed = job.apply_metrics(
        progress.percent,
        sanitize_remaining(snapshot.remaining_time),
        &snapshot,
    );

    for index in &report.newly_failed {
        let message = job
            .chunks()
            .get(index)
            .and_then(|chunk| chunk.error_message())
            .unwrap_or_default();
        tracker_warn!("Job {} chunk {} failed: {}", job_id, index, message);
    }
    if !report.ignored.is_empty() {
        tracker_debug!(
            "Job {} ignored regressing chunk updates for {:?}",
            job_id,
            report.ignored
        );
    }
    if report.changed() || metrics_changed {
        state.mark_dirty();
    }

    match snapshot.status {
        Some(RemoteJobStatus::Completed) => finish(state, job_id),
        Some(RemoteJobStatus::Failed) => {
            let message = snapshot
                .error
                .unwrap_or_else(|| "unknown error".to_string());
            tracker_warn!("Job {} failed on the server: {}", job_id, message);
            state.fail(TrackerError::JobFailure(message));
            vec![Effect::StopPolling]
        }
        Some(RemoteJobStatus::Pending | RemoteJobStatus::InProgress) | None => Vec::new(),
    }
}

fn finish(state: &mut TrackerState, job_id: &JobId) -> Vec<Effect> {
    let Some(job) = state.job() else {
        return Vec::new();
    };
    let assembled = assemble(job.chunks());
    let artifact_url = job.artifact_url().map(ToOwned::to_owned);

    if !assembled.missing.is_empty() {
        // Server contract violation: success while some chunks are not done.
        let warning = format!(
            "job completed but chunks {:?} have no translation",
            assembled.missing
        );
        tracker_warn!("Job {}: {}", job_id, warning);
        state.push_warning(warning);
    }
    tracker_info!(
        "Job {} completed with {} translated chunks",
        job_id,
        assembled.contributing
    );

    let text = assembled.text.clone();
    state.complete(assembled);
    vec![
        Effect::StopPolling,
        Effect::ExportResult {
            job_id: job_id.clone(),
            text,
            artifact_url,
        },
    ]
}
