use thiserror::Error;

/// Problems with a start request, detected before anything is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no source document selected")]
    MissingSource,
    #[error("pages per chunk must be at least 1")]
    InvalidChunkSize,
    #[error("an API key is required")]
    MissingCredential,
}

/// Errors surfaced to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("submission failed: {0}")]
    Submission(String),
    #[error("translation failed: {0}")]
    JobFailure(String),
    #[error("lost contact with the server after {attempts} failed polls: {last_error}")]
    PollAbandoned { attempts: u32, last_error: String },
}
