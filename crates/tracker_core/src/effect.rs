use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Submit {
        ticket: crate::SubmissionTicket,
        submission: crate::ValidatedSubmission,
    },
    StartPolling {
        job_id: crate::JobId,
        interval: Duration,
    },
    StopPolling,
    /// Hand the assembled text (and artifact reference) to the export collaborator.
    ExportResult {
        job_id: crate::JobId,
        text: String,
        artifact_url: Option<String>,
    },
}
