//! Tracker core: pure job state machine, snapshot reconciliation and view-model helpers.
mod assemble;
mod effect;
mod error;
mod estimate;
mod msg;
mod reconcile;
mod state;
mod update;
mod view_model;

pub use assemble::{assemble, AssembledText, CHUNK_SEPARATOR};
pub use effect::Effect;
pub use error::{TrackerError, ValidationError};
pub use estimate::{clamp_percent, estimate, remaining_time, ProgressEstimate, RemainingTime};
pub use msg::{Msg, PollErrorKind};
pub use reconcile::{reconcile, ChunkChange, ReconcileReport, UNKNOWN_CHUNK_ERROR};
pub use state::{
    ChunkIndex, ChunkMap, ChunkSnapshot, ChunkState, ChunkStatus, ControllerState, Job, JobId,
    JobSnapshot, JobStatus, RemoteJobStatus, SubmissionTicket, SubmitRequest, TrackerSettings,
    TrackerState, ValidatedSubmission, DEFAULT_MAX_POLL_ERRORS, DEFAULT_POLL_INTERVAL,
};
pub use update::update;
pub use view_model::{ChunkView, ExportState, TrackerViewModel};
