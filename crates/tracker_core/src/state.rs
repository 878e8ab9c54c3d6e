use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::assemble::AssembledText;
use crate::error::{TrackerError, ValidationError};
use crate::view_model::{ChunkView, ExportState, TrackerViewModel};
use crate::{remaining_time, RemainingTime};

/// Opaque identifier assigned by the server when a document is submitted.
pub type JobId = String;
pub type ChunkIndex = u32;
/// Local correlation id for one submission attempt.
pub type SubmissionTicket = u64;
pub type ChunkMap = BTreeMap<ChunkIndex, ChunkState>;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_MAX_POLL_ERRORS: u32 = 10;

/// Lifecycle of the tracked job as seen by the local model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Request accepted locally but not yet handed to the uploader. The
    /// controller creates jobs in `Uploading` because it validates and emits
    /// the submit effect in the same step, so a stored job never reports this.
    Pending,
    Uploading,
    Tracking,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Job status as reported by the server in a progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteJobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Controller-level state exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Uploading,
    Tracking,
    Completed,
    Failed,
}

/// Chunk status with the partial order `Pending < InProgress < {Completed, Failed}`.
///
/// `Completed` and `Failed` are incomparable: `partial_cmp` returns `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ChunkStatus {
    fn rank(self) -> u8 {
        match self {
            ChunkStatus::Pending => 0,
            ChunkStatus::InProgress => 1,
            ChunkStatus::Completed | ChunkStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 2
    }
}

impl PartialOrd for ChunkStatus {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        match self.rank().cmp(&other.rank()) {
            Ordering::Equal => None,
            ord => Some(ord),
        }
    }
}

/// One chunk as described by a single server snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSnapshot {
    pub index: ChunkIndex,
    pub pages: Vec<u32>,
    pub status: ChunkStatus,
    pub translated_text: Option<String>,
    pub error: Option<String>,
}

/// One server response describing the job at a point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobSnapshot {
    pub status: Option<RemoteJobStatus>,
    pub progress: Option<f64>,
    pub remaining_time: Option<f64>,
    pub chunks: Vec<ChunkSnapshot>,
    pub artifact_url: Option<String>,
    pub error: Option<String>,
    pub total_pages: Option<u32>,
    pub elapsed_seconds: Option<f64>,
}

/// Locally reconciled state of one chunk.
///
/// `translated_text` is set only while `status == Completed` and
/// `error_message` only while `status == Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkState {
    pub(crate) index: ChunkIndex,
    pub(crate) pages: Vec<u32>,
    pub(crate) status: ChunkStatus,
    pub(crate) translated_text: Option<String>,
    pub(crate) error_message: Option<String>,
}

impl ChunkState {
    pub(crate) fn pending(index: ChunkIndex, pages: Vec<u32>) -> Self {
        Self {
            index,
            pages,
            status: ChunkStatus::Pending,
            translated_text: None,
            error_message: None,
        }
    }

    pub fn index(&self) -> ChunkIndex {
        self.index
    }

    pub fn pages(&self) -> &[u32] {
        &self.pages
    }

    pub fn status(&self) -> ChunkStatus {
        self.status
    }

    pub fn translated_text(&self) -> Option<&str> {
        self.translated_text.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Start request coming from the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitRequest {
    pub source: Option<PathBuf>,
    pub pages_per_chunk: Option<u32>,
    pub api_key: Option<String>,
}

/// A start request that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub source: PathBuf,
    pub pages_per_chunk: u32,
    pub api_key: String,
}

impl SubmitRequest {
    pub fn validate(self) -> Result<ValidatedSubmission, ValidationError> {
        let source = self
            .source
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(ValidationError::MissingSource)?;
        let pages_per_chunk = self
            .pages_per_chunk
            .filter(|pages| *pages >= 1)
            .ok_or(ValidationError::InvalidChunkSize)?;
        let api_key = self
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ValidationError::MissingCredential)?;
        Ok(ValidatedSubmission {
            source,
            pages_per_chunk,
            api_key,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    pub poll_interval: Duration,
    /// Consecutive failed polls before the job is abandoned; `0` never abandons.
    pub max_consecutive_poll_errors: u32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_poll_errors: DEFAULT_MAX_POLL_ERRORS,
        }
    }
}

/// The single translation job owned by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: Option<JobId>,
    status: JobStatus,
    source: PathBuf,
    progress_percent: f64,
    remaining_time_seconds: Option<f64>,
    chunks: ChunkMap,
    total_pages: Option<u32>,
    elapsed_seconds: Option<f64>,
    artifact_url: Option<String>,
    error: Option<String>,
    /// Set by the first accepted snapshot.
    registered: bool,
}

impl Job {
    /// A job exists only once its upload has been dispatched.
    fn uploading(source: PathBuf) -> Self {
        Self {
            id: None,
            status: JobStatus::Uploading,
            source,
            progress_percent: 0.0,
            remaining_time_seconds: None,
            chunks: ChunkMap::new(),
            total_pages: None,
            elapsed_seconds: None,
            artifact_url: None,
            error: None,
            registered: false,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn source(&self) -> &std::path::Path {
        &self.source
    }

    pub fn progress_percent(&self) -> f64 {
        self.progress_percent
    }

    pub fn remaining_time_seconds(&self) -> Option<f64> {
        self.remaining_time_seconds
    }

    pub fn chunks(&self) -> &ChunkMap {
        &self.chunks
    }

    pub fn artifact_url(&self) -> Option<&str> {
        self.artifact_url.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the server has answered at least one poll with a snapshot.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub(crate) fn chunks_mut(&mut self) -> &mut ChunkMap {
        &mut self.chunks
    }

    /// Returns true if any scalar field changed.
    pub(crate) fn apply_metrics(
        &mut self,
        percent: f64,
        remaining_time_seconds: Option<f64>,
        snapshot: &JobSnapshot,
    ) -> bool {
        let before = (
            self.progress_percent,
            self.remaining_time_seconds,
            self.total_pages,
            self.elapsed_seconds,
            self.artifact_url.clone(),
        );
        self.progress_percent = percent;
        self.remaining_time_seconds = remaining_time_seconds;
        if snapshot.total_pages.is_some() {
            self.total_pages = snapshot.total_pages;
        }
        if snapshot.elapsed_seconds.is_some() {
            self.elapsed_seconds = snapshot.elapsed_seconds;
        }
        if snapshot.artifact_url.is_some() {
            self.artifact_url = snapshot.artifact_url.clone();
        }
        before
            != (
                self.progress_percent,
                self.remaining_time_seconds,
                self.total_pages,
                self.elapsed_seconds,
                self.artifact_url.clone(),
            )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerState {
    settings: TrackerSettings,
    job: Option<Job>,
    pending_ticket: Option<SubmissionTicket>,
    next_ticket: SubmissionTicket,
    consecutive_poll_errors: u32,
    result: Option<AssembledText>,
    last_error: Option<TrackerError>,
    warnings: Vec<String>,
    export: ExportState,
    dirty: bool,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: TrackerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> TrackerSettings {
        self.settings
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn result(&self) -> Option<&AssembledText> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&TrackerError> {
        self.last_error.as_ref()
    }

    pub fn export(&self) -> &ExportState {
        &self.export
    }

    pub fn controller_state(&self) -> ControllerState {
        match self.job.as_ref().map(Job::status) {
            None => ControllerState::Idle,
            Some(JobStatus::Pending | JobStatus::Uploading) => ControllerState::Uploading,
            Some(JobStatus::Tracking) => ControllerState::Tracking,
            Some(JobStatus::Completed) => ControllerState::Completed,
            Some(JobStatus::Failed) => ControllerState::Failed,
        }
    }

    pub fn view(&self) -> TrackerViewModel {
        let job = self.job.as_ref();
        TrackerViewModel {
            state: self.controller_state(),
            job_id: job.and_then(|job| job.id.clone()),
            source: job.map(|job| job.source.clone()),
            percent: job.map_or(0.0, |job| job.progress_percent),
            remaining: job.map_or(RemainingTime::Calculating, |job| {
                remaining_time(job.remaining_time_seconds)
            }),
            total_pages: job.and_then(|job| job.total_pages),
            elapsed_seconds: job.and_then(|job| job.elapsed_seconds),
            chunks: job
                .map(|job| job.chunks.values().map(ChunkView::from).collect())
                .unwrap_or_default(),
            result_text: self.result.as_ref().map(|result| result.text.clone()),
            artifact_url: job.and_then(|job| job.artifact_url.clone()),
            error: self.last_error.clone(),
            warnings: self.warnings.clone(),
            export: self.export.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn begin_submission(&mut self, source: PathBuf) -> SubmissionTicket {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.job = Some(Job::uploading(source));
        self.pending_ticket = Some(ticket);
        self.last_error = None;
        self.warnings.clear();
        self.mark_dirty();
        ticket
    }

    pub(crate) fn is_pending_submission(&self, ticket: SubmissionTicket) -> bool {
        self.pending_ticket == Some(ticket)
            && self.controller_state() == ControllerState::Uploading
    }

    pub(crate) fn begin_tracking(&mut self, job_id: JobId) {
        self.pending_ticket = None;
        self.consecutive_poll_errors = 0;
        if let Some(job) = self.job.as_mut() {
            // The id is immutable once assigned.
            if job.id.is_none() {
                job.id = Some(job_id);
            }
            job.status = JobStatus::Tracking;
        }
        self.mark_dirty();
    }

    pub(crate) fn abandon_submission(&mut self, error: TrackerError) {
        self.pending_ticket = None;
        self.job = None;
        self.last_error = Some(error);
        self.mark_dirty();
    }

    /// True when snapshots for `job_id` may still mutate the model.
    pub(crate) fn is_tracking(&self, job_id: &str) -> bool {
        self.job
            .as_ref()
            .is_some_and(|job| job.status == JobStatus::Tracking && job.id() == Some(job_id))
    }

    pub(crate) fn is_completed_job(&self, job_id: &str) -> bool {
        self.job
            .as_ref()
            .is_some_and(|job| job.status == JobStatus::Completed && job.id() == Some(job_id))
    }

    pub(crate) fn job_mut(&mut self) -> Option<&mut Job> {
        self.job.as_mut()
    }

    pub(crate) fn record_poll_success(&mut self) {
        self.consecutive_poll_errors = 0;
        if let Some(job) = self.job.as_mut() {
            job.registered = true;
        }
    }

    /// Counts a failed poll and returns the number of consecutive failures.
    pub(crate) fn record_poll_error(&mut self) -> u32 {
        self.consecutive_poll_errors = self.consecutive_poll_errors.saturating_add(1);
        self.consecutive_poll_errors
    }

    pub(crate) fn complete(&mut self, result: AssembledText) {
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Completed;
        }
        self.result = Some(result);
        self.export = ExportState::InProgress;
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self, error: TrackerError) {
        if let Some(job) = self.job.as_mut() {
            job.status = JobStatus::Failed;
            if let TrackerError::JobFailure(message) = &error {
                job.error = Some(message.clone());
            }
        }
        self.last_error = Some(error);
        self.mark_dirty();
    }

    pub(crate) fn push_warning(&mut self, warning: String) {
        self.warnings.push(warning);
        self.mark_dirty();
    }

    pub(crate) fn set_validation_error(&mut self, error: ValidationError) {
        self.last_error = Some(error.into());
        self.mark_dirty();
    }

    pub(crate) fn set_export(&mut self, export: ExportState) {
        self.export = export;
        self.mark_dirty();
    }

    /// Discards the job and everything derived from it. Settings and the
    /// ticket counter survive so late results from the old job stay stale.
    pub(crate) fn reset(&mut self) {
        self.job = None;
        self.pending_ticket = None;
        self.consecutive_poll_errors = 0;
        self.result = None;
        self.last_error = None;
        self.warnings.clear();
        self.export = ExportState::NotRequested;
        self.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_status_partial_order() {
        use ChunkStatus::*;
        assert!(Pending < InProgress);
        assert!(InProgress < Completed);
        assert!(InProgress < Failed);
        assert!(Pending < Failed);
        assert_eq!(Completed.partial_cmp(&Failed), None);
        assert_eq!(Failed.partial_cmp(&Completed), None);
        assert_eq!(Completed.partial_cmp(&Completed), Some(Ordering::Equal));
    }

    #[test]
    fn validation_trims_credential_and_rejects_missing_parts() {
        let request = SubmitRequest {
            source: Some(PathBuf::from("book.pdf")),
            pages_per_chunk: Some(5),
            api_key: Some("  key  ".to_string()),
        };
        let submission = request.clone().validate().unwrap();
        assert_eq!(submission.api_key, "key");

        let missing_source = SubmitRequest {
            source: None,
            ..request.clone()
        };
        assert_eq!(
            missing_source.validate(),
            Err(ValidationError::MissingSource)
        );

        let zero_pages = SubmitRequest {
            pages_per_chunk: Some(0),
            ..request.clone()
        };
        assert_eq!(zero_pages.validate(), Err(ValidationError::InvalidChunkSize));

        let blank_key = SubmitRequest {
            api_key: Some("   ".to_string()),
            ..request
        };
        assert_eq!(blank_key.validate(), Err(ValidationError::MissingCredential));
    }
}
