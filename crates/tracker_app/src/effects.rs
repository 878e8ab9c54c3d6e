use std::sync::mpsc;
use std::thread;

use tracker_core::{
    ChunkSnapshot, ChunkStatus, Effect, JobSnapshot, Msg, PollErrorKind, RemoteJobStatus,
};
use tracker_engine::{
    ChunkReport, EngineEvent, EngineHandle, ExportRequest, ProgressReport, RemoteStatus,
    ServiceFailure, UploadRequest,
};
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

use crate::config::ExportSettings;

/// Executes core effects on the engine and feeds engine events back as messages.
pub struct EffectRunner {
    engine: EngineHandle,
    export: ExportSettings,
}

impl EffectRunner {
    /// Subscribes to `events` once; the forwarding thread lives as long as the engine.
    pub fn new(
        engine: EngineHandle,
        events: mpsc::Receiver<EngineEvent>,
        export: ExportSettings,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        thread::spawn(move || {
            while let Ok(event) = events.recv() {
                if msg_tx.send(event_to_msg(event)).is_err() {
                    break;
                }
            }
            tracker_debug!("Engine event forwarding stopped");
        });
        Self { engine, export }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Submit { ticket, submission } => {
                    tracker_info!("Submit ticket={} source={:?}", ticket, submission.source);
                    self.engine.submit(
                        ticket,
                        UploadRequest {
                            source: submission.source,
                            pages_per_chunk: submission.pages_per_chunk,
                            api_key: submission.api_key,
                        },
                    );
                }
                Effect::StartPolling { job_id, interval } => {
                    self.engine.start_polling(job_id, interval);
                }
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::ExportResult {
                    job_id,
                    text,
                    artifact_url,
                } => {
                    self.engine.export(
                        job_id,
                        ExportRequest {
                            text,
                            artifact_url,
                            output_dir: self.export.output_dir.clone(),
                            download_artifact: self.export.download_artifact,
                            fetch_server_text: self.export.fetch_server_text,
                        },
                    );
                }
            }
        }
    }
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Submitted { ticket, result } => match result {
            Ok(job_id) => Msg::SubmissionSucceeded { ticket, job_id },
            Err(err) => Msg::SubmissionFailed {
                ticket,
                message: err.to_string(),
            },
        },
        EngineEvent::Progress { job_id, result } => match result {
            Ok(report) => Msg::SnapshotReceived {
                snapshot: to_snapshot(&job_id, report),
                job_id,
            },
            Err(err) => Msg::PollFailed {
                job_id,
                kind: poll_error_kind(&err.kind),
                message: err.to_string(),
            },
        },
        EngineEvent::Exported { job_id, result } => Msg::ExportFinished {
            job_id,
            result: result
                .map(|summary| summary.paths())
                .map_err(|err| err.to_string()),
        },
    }
}

/// The server answers `{ error }` for jobs it does not know yet.
fn poll_error_kind(failure: &ServiceFailure) -> PollErrorKind {
    match failure {
        ServiceFailure::Rejected | ServiceFailure::HttpStatus(404) => PollErrorKind::NotFound,
        _ => PollErrorKind::Transport,
    }
}

pub(crate) fn to_snapshot(job_id: &str, report: ProgressReport) -> JobSnapshot {
    let status = report.status.and_then(|status| match status {
        RemoteStatus::Pending => Some(RemoteJobStatus::Pending),
        RemoteStatus::InProgress | RemoteStatus::Retrying(_) => Some(RemoteJobStatus::InProgress),
        RemoteStatus::Completed => Some(RemoteJobStatus::Completed),
        RemoteStatus::Failed => Some(RemoteJobStatus::Failed),
        RemoteStatus::Unknown(raw) => {
            tracker_warn!("Job {} reported unknown status {:?}", job_id, raw);
            None
        }
    });
    JobSnapshot {
        status,
        progress: report.progress,
        remaining_time: report.remaining_time,
        chunks: report
            .chunks
            .into_iter()
            .map(|chunk| to_chunk_snapshot(job_id, chunk))
            .collect(),
        artifact_url: report.pdf_url,
        error: report.error,
        total_pages: report.total_pages,
        elapsed_seconds: report.elapsed_time,
    }
}

fn to_chunk_snapshot(job_id: &str, chunk: ChunkReport) -> ChunkSnapshot {
    let status = match chunk.status {
        RemoteStatus::Pending => ChunkStatus::Pending,
        RemoteStatus::InProgress | RemoteStatus::Retrying(_) => ChunkStatus::InProgress,
        RemoteStatus::Completed => ChunkStatus::Completed,
        RemoteStatus::Failed => ChunkStatus::Failed,
        RemoteStatus::Unknown(raw) => {
            tracker_warn!(
                "Job {} chunk {} reported unknown status {:?}; treating as pending",
                job_id,
                chunk.chunk_index,
                raw
            );
            ChunkStatus::Pending
        }
    };
    ChunkSnapshot {
        index: chunk.chunk_index,
        pages: chunk.pages,
        status,
        translated_text: chunk.translated_text,
        error: chunk.error,
    }
}
