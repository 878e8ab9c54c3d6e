use std::path::PathBuf;
use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tracker_core::{
    update, ChunkSnapshot, ChunkStatus, ControllerState, Effect, ExportState, JobSnapshot,
    JobStatus, Msg, PollErrorKind, RemoteJobStatus, SubmitRequest, TrackerError, TrackerSettings,
    TrackerState, ValidationError,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn request() -> SubmitRequest {
    SubmitRequest {
        source: Some(PathBuf::from("book.pdf")),
        pages_per_chunk: Some(10),
        api_key: Some("secret".to_string()),
    }
}

fn submit(state: TrackerState) -> (TrackerState, u64) {
    let (state, effects) = update(state, Msg::StartRequested(request()));
    let ticket = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::Submit { ticket, .. } => Some(*ticket),
            _ => None,
        })
        .expect("submit effect");
    (state, ticket)
}

fn tracking(job_id: &str) -> TrackerState {
    let (state, ticket) = submit(TrackerState::new());
    let (state, _) = update(
        state,
        Msg::SubmissionSucceeded {
            ticket,
            job_id: job_id.to_string(),
        },
    );
    state
}

fn chunk(index: u32, status: ChunkStatus, text: Option<&str>) -> ChunkSnapshot {
    ChunkSnapshot {
        index,
        pages: vec![index * 10 + 1],
        status,
        translated_text: text.map(ToOwned::to_owned),
        error: None,
    }
}

fn snapshot(status: RemoteJobStatus, progress: f64, chunks: Vec<ChunkSnapshot>) -> JobSnapshot {
    JobSnapshot {
        status: Some(status),
        progress: Some(progress),
        remaining_time: Some(125.0),
        chunks,
        ..JobSnapshot::default()
    }
}

fn deliver(state: TrackerState, job_id: &str, snapshot: JobSnapshot) -> (TrackerState, Vec<Effect>) {
    update(
        state,
        Msg::SnapshotReceived {
            job_id: job_id.to_string(),
            snapshot,
        },
    )
}

#[test]
fn start_submits_validated_request() {
    init_logging();
    let (mut state, effects) = update(TrackerState::new(), Msg::StartRequested(request()));

    assert_eq!(state.controller_state(), ControllerState::Uploading);
    assert!(state.consume_dirty());
    assert_eq!(effects.len(), 1);
    match &effects[0] {
        Effect::Submit { submission, .. } => {
            assert_eq!(submission.source, PathBuf::from("book.pdf"));
            assert_eq!(submission.pages_per_chunk, 10);
            assert_eq!(submission.api_key, "secret");
        }
        other => panic!("unexpected effect {other:?}"),
    }
}

#[test]
fn invalid_start_stays_idle_without_effects() {
    init_logging();
    let request = SubmitRequest {
        api_key: None,
        ..request()
    };
    let (state, effects) = update(TrackerState::new(), Msg::StartRequested(request));

    assert!(effects.is_empty());
    assert_eq!(state.controller_state(), ControllerState::Idle);
    assert!(state.job().is_none());
    assert_eq!(
        state.view().error,
        Some(TrackerError::Validation(ValidationError::MissingCredential))
    );
}

#[test]
fn second_start_while_uploading_is_ignored() {
    init_logging();
    let (state, _ticket) = submit(TrackerState::new());
    let (state, effects) = update(state, Msg::StartRequested(request()));

    assert!(effects.is_empty());
    assert_eq!(state.controller_state(), ControllerState::Uploading);
}

#[test]
fn submission_success_starts_polling() {
    init_logging();
    let (state, ticket) = submit(TrackerState::new());
    let (state, effects) = update(
        state,
        Msg::SubmissionSucceeded {
            ticket,
            job_id: "job-1".to_string(),
        },
    );

    assert_eq!(state.controller_state(), ControllerState::Tracking);
    assert_eq!(state.view().job_id.as_deref(), Some("job-1"));
    assert_eq!(
        effects,
        vec![Effect::StartPolling {
            job_id: "job-1".to_string(),
            interval: Duration::from_secs(3),
        }]
    );
}

#[test]
fn submission_failure_returns_to_idle() {
    init_logging();
    let (state, ticket) = submit(TrackerState::new());
    let (state, effects) = update(
        state,
        Msg::SubmissionFailed {
            ticket,
            message: "Only PDF files are allowed".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.controller_state(), ControllerState::Idle);
    assert_eq!(
        state.view().error,
        Some(TrackerError::Submission(
            "Only PDF files are allowed".to_string()
        ))
    );
}

#[test]
fn snapshots_update_chunks_and_progress() {
    init_logging();
    let state = tracking("job-1");
    let (mut state, effects) = deliver(
        state,
        "job-1",
        snapshot(
            RemoteJobStatus::InProgress,
            50.0,
            vec![
                chunk(1, ChunkStatus::Completed, Some("B")),
                chunk(0, ChunkStatus::InProgress, None),
            ],
        ),
    );

    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    let view = state.view();
    assert_eq!(view.state, ControllerState::Tracking);
    assert_eq!(view.percent, 50.0);
    assert_eq!(view.remaining.to_string(), "2 min 5 s");
    let indices: Vec<_> = view.chunks.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(view.chunks[1].translated_text.as_deref(), Some("B"));
}

#[test]
fn completion_assembles_text_and_stops_polling() {
    init_logging();
    let state = tracking("job-1");
    let (state, _) = deliver(
        state,
        "job-1",
        snapshot(
            RemoteJobStatus::InProgress,
            50.0,
            vec![chunk(1, ChunkStatus::Completed, Some("B"))],
        ),
    );
    let mut done = snapshot(
        RemoteJobStatus::Completed,
        100.0,
        vec![chunk(0, ChunkStatus::Completed, Some("A"))],
    );
    done.artifact_url = Some("/download/job-1".to_string());
    let (state, effects) = deliver(state, "job-1", done);

    assert_eq!(state.controller_state(), ControllerState::Completed);
    assert_eq!(
        effects,
        vec![
            Effect::StopPolling,
            Effect::ExportResult {
                job_id: "job-1".to_string(),
                text: "A\n\nB".to_string(),
                artifact_url: Some("/download/job-1".to_string()),
            },
        ]
    );
    let view = state.view();
    assert_eq!(view.result_text.as_deref(), Some("A\n\nB"));
    assert_eq!(view.export, ExportState::InProgress);
    assert!(view.warnings.is_empty());
}

#[test]
fn completion_with_unfinished_chunks_warns() {
    init_logging();
    let state = tracking("job-1");
    let (state, effects) = deliver(
        state,
        "job-1",
        snapshot(
            RemoteJobStatus::Completed,
            100.0,
            vec![
                chunk(0, ChunkStatus::Completed, Some("A")),
                chunk(1, ChunkStatus::InProgress, None),
            ],
        ),
    );

    assert_eq!(state.controller_state(), ControllerState::Completed);
    assert_eq!(effects.len(), 2);
    let view = state.view();
    assert_eq!(view.result_text.as_deref(), Some("A"));
    assert_eq!(view.warnings.len(), 1);
    assert!(view.warnings[0].contains("[1]"));
}

#[test]
fn chunk_failure_does_not_fail_the_job() {
    init_logging();
    let state = tracking("job-1");
    let mut failed = chunk(0, ChunkStatus::Failed, None);
    failed.error = Some("quota exceeded".to_string());
    let (state, effects) = deliver(
        state,
        "job-1",
        snapshot(RemoteJobStatus::InProgress, 10.0, vec![failed]),
    );

    assert!(effects.is_empty());
    assert_eq!(state.controller_state(), ControllerState::Tracking);
    assert_eq!(
        state.view().chunks[0].error.as_deref(),
        Some("quota exceeded")
    );
}

#[test]
fn server_failure_is_terminal() {
    init_logging();
    let state = tracking("job-1");
    let mut failed = snapshot(RemoteJobStatus::Failed, 20.0, Vec::new());
    failed.error = Some("bad pdf".to_string());
    let (state, effects) = deliver(state, "job-1", failed);

    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.controller_state(), ControllerState::Failed);
    assert_eq!(state.job().unwrap().error(), Some("bad pdf"));
    assert_eq!(
        state.view().error,
        Some(TrackerError::JobFailure("bad pdf".to_string()))
    );
}

#[test]
fn terminal_job_ignores_further_snapshots() {
    init_logging();
    let state = tracking("job-1");
    let (mut state, _) = deliver(
        state,
        "job-1",
        snapshot(
            RemoteJobStatus::Completed,
            100.0,
            vec![chunk(0, ChunkStatus::Completed, Some("A"))],
        ),
    );
    state.consume_dirty();
    let before = state.view();

    let (mut state, effects) = deliver(
        state,
        "job-1",
        snapshot(
            RemoteJobStatus::InProgress,
            30.0,
            vec![
                chunk(0, ChunkStatus::Completed, Some("changed")),
                chunk(1, ChunkStatus::InProgress, None),
            ],
        ),
    );

    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.view(), before);
}

#[test]
fn snapshot_for_other_job_is_discarded() {
    init_logging();
    let mut state = tracking("job-2");
    state.consume_dirty();
    let (mut state, effects) = deliver(
        state,
        "job-1",
        snapshot(
            RemoteJobStatus::Completed,
            100.0,
            vec![chunk(0, ChunkStatus::Completed, Some("old"))],
        ),
    );

    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.controller_state(), ControllerState::Tracking);
    assert!(state.view().chunks.is_empty());
}

#[test]
fn reset_while_fetch_in_flight_discards_late_response() {
    init_logging();
    let state = tracking("job-1");
    let (mut state, effects) = update(state, Msg::ResetRequested);
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.controller_state(), ControllerState::Idle);
    state.consume_dirty();
    let idle = state.view();

    let (mut state, effects) = deliver(
        state,
        "job-1",
        snapshot(
            RemoteJobStatus::InProgress,
            80.0,
            vec![chunk(0, ChunkStatus::InProgress, None)],
        ),
    );

    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.view(), idle);
}

#[test]
fn late_submission_result_after_reset_is_discarded() {
    init_logging();
    let (state, old_ticket) = submit(TrackerState::new());
    let (state, _) = update(state, Msg::ResetRequested);
    let (state, new_ticket) = submit(state);
    assert_ne!(old_ticket, new_ticket);

    let (state, effects) = update(
        state,
        Msg::SubmissionSucceeded {
            ticket: old_ticket,
            job_id: "stale".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.controller_state(), ControllerState::Uploading);
    assert_eq!(state.view().job_id, None);
}

#[test]
fn reset_after_completion_clears_everything() {
    init_logging();
    let state = tracking("job-1");
    let (state, _) = deliver(
        state,
        "job-1",
        snapshot(
            RemoteJobStatus::Completed,
            100.0,
            vec![chunk(0, ChunkStatus::Completed, Some("A"))],
        ),
    );
    let (state, _) = update(state, Msg::ResetRequested);
    let view = state.view();

    assert_eq!(view.state, ControllerState::Idle);
    assert!(view.chunks.is_empty());
    assert_eq!(view.result_text, None);
    assert_eq!(view.percent, 0.0);
    assert_eq!(view.export, ExportState::NotRequested);
}

#[test]
fn poll_errors_are_tolerated_until_limit() {
    init_logging();
    let settings = TrackerSettings {
        max_consecutive_poll_errors: 3,
        ..TrackerSettings::default()
    };
    let (state, ticket) = submit(TrackerState::with_settings(settings));
    let (mut state, _) = update(
        state,
        Msg::SubmissionSucceeded {
            ticket,
            job_id: "job-1".to_string(),
        },
    );

    for _ in 0..2 {
        let (next, effects) = update(
            state,
            Msg::PollFailed {
                job_id: "job-1".to_string(),
                kind: PollErrorKind::Transport,
                message: "connection refused".to_string(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(next.controller_state(), ControllerState::Tracking);
        state = next;
    }

    // A good snapshot resets the counter.
    let (mut state, _) = deliver(
        state,
        "job-1",
        snapshot(RemoteJobStatus::InProgress, 5.0, Vec::new()),
    );
    for _ in 0..2 {
        let (next, effects) = update(
            state,
            Msg::PollFailed {
                job_id: "job-1".to_string(),
                kind: PollErrorKind::Transport,
                message: "connection refused".to_string(),
            },
        );
        assert!(effects.is_empty());
        state = next;
    }

    let (state, effects) = update(
        state,
        Msg::PollFailed {
            job_id: "job-1".to_string(),
            kind: PollErrorKind::Transport,
            message: "connection refused".to_string(),
        },
    );
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.controller_state(), ControllerState::Failed);
    assert_eq!(
        state.view().error,
        Some(TrackerError::PollAbandoned {
            attempts: 3,
            last_error: "connection refused".to_string(),
        })
    );
}

#[test]
fn zero_tolerance_polls_forever() {
    init_logging();
    let settings = TrackerSettings {
        max_consecutive_poll_errors: 0,
        ..TrackerSettings::default()
    };
    let (state, ticket) = submit(TrackerState::with_settings(settings));
    let (mut state, _) = update(
        state,
        Msg::SubmissionSucceeded {
            ticket,
            job_id: "job-1".to_string(),
        },
    );
    for _ in 0..50 {
        let (next, effects) = update(
            state,
            Msg::PollFailed {
                job_id: "job-1".to_string(),
                kind: PollErrorKind::Transport,
                message: "timeout".to_string(),
            },
        );
        assert!(effects.is_empty());
        state = next;
    }
    assert_eq!(state.controller_state(), ControllerState::Tracking);
}

#[test]
fn export_result_is_recorded_for_completed_job() {
    init_logging();
    let state = tracking("job-1");
    let (state, _) = deliver(
        state,
        "job-1",
        snapshot(
            RemoteJobStatus::Completed,
            100.0,
            vec![chunk(0, ChunkStatus::Completed, Some("A"))],
        ),
    );
    let (state, _) = update(
        state,
        Msg::ExportFinished {
            job_id: "job-1".to_string(),
            result: Ok(vec![PathBuf::from("out/job-1_translated.txt")]),
        },
    );

    assert_eq!(
        state.view().export,
        ExportState::Written(vec![PathBuf::from("out/job-1_translated.txt")])
    );
}

fn not_found(job_id: &str) -> Msg {
    Msg::PollFailed {
        job_id: job_id.to_string(),
        kind: PollErrorKind::NotFound,
        message: "rejected by server: Job not found".to_string(),
    }
}

#[test]
fn job_starts_uploading_and_unregistered() {
    init_logging();
    let (state, _) = submit(TrackerState::new());
    let job = state.job().expect("job");
    assert_eq!(job.status(), JobStatus::Uploading);
    assert!(!job.is_registered());
}

#[test]
fn unknown_job_before_first_snapshot_keeps_polling() {
    init_logging();
    let mut state = tracking("job-1");

    // Splitting a large document can outlast many poll intervals.
    for _ in 0..25 {
        let (next, effects) = update(state, not_found("job-1"));
        assert!(effects.is_empty());
        assert_eq!(next.controller_state(), ControllerState::Tracking);
        assert_eq!(next.view().error, None);
        state = next;
    }

    let (state, effects) = deliver(
        state,
        "job-1",
        snapshot(RemoteJobStatus::InProgress, 10.0, Vec::new()),
    );
    assert!(effects.is_empty());
    assert!(state.job().expect("job").is_registered());
    assert_eq!(state.view().percent, 10.0);
}

#[test]
fn unknown_job_after_first_snapshot_counts_toward_tolerance() {
    init_logging();
    let settings = TrackerSettings {
        max_consecutive_poll_errors: 2,
        ..TrackerSettings::default()
    };
    let (state, ticket) = submit(TrackerState::with_settings(settings));
    let (state, _) = update(
        state,
        Msg::SubmissionSucceeded {
            ticket,
            job_id: "job-1".to_string(),
        },
    );
    let (state, _) = deliver(
        state,
        "job-1",
        snapshot(RemoteJobStatus::InProgress, 10.0, Vec::new()),
    );

    let (state, effects) = update(state, not_found("job-1"));
    assert!(effects.is_empty());
    let (state, effects) = update(state, not_found("job-1"));
    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(state.controller_state(), ControllerState::Failed);
}
