use std::path::PathBuf;

/// Why a poll produced no snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollErrorKind {
    /// Unreachable server, timeout, or an unusable response.
    Transport,
    /// The server does not know the job. Right after upload this only means
    /// it has not finished splitting the document yet.
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User asked to translate a document.
    StartRequested(crate::SubmitRequest),
    /// Submission collaborator accepted the upload.
    SubmissionSucceeded {
        ticket: crate::SubmissionTicket,
        job_id: crate::JobId,
    },
    /// Submission collaborator reported an error.
    SubmissionFailed {
        ticket: crate::SubmissionTicket,
        message: String,
    },
    /// Poller delivered a progress snapshot, tagged with the job it was requested for.
    SnapshotReceived {
        job_id: crate::JobId,
        snapshot: crate::JobSnapshot,
    },
    /// A single poll produced no snapshot.
    PollFailed {
        job_id: crate::JobId,
        kind: PollErrorKind,
        message: String,
    },
    /// Export collaborator finished writing the result.
    ExportFinished {
        job_id: crate::JobId,
        result: Result<Vec<PathBuf>, String>,
    },
    /// User asked to discard the current job.
    ResetRequested,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
