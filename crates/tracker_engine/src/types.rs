use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use crate::export::{ExportError, ExportSummary};

pub type JobId = String;

/// Status string reported by the server for a job or a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RemoteStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    /// Transient `error` or `retrying (n/m)` while the server retries a chunk.
    Retrying(String),
    Unknown(String),
}

impl From<String> for RemoteStatus {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        let known = match trimmed {
            "pending" => Some(RemoteStatus::Pending),
            "in_progress" => Some(RemoteStatus::InProgress),
            "completed" => Some(RemoteStatus::Completed),
            "failed" => Some(RemoteStatus::Failed),
            _ => None,
        };
        let retrying = trimmed == "error" || trimmed.starts_with("retrying");
        match known {
            Some(status) => status,
            None if retrying => RemoteStatus::Retrying(raw),
            None => RemoteStatus::Unknown(raw),
        }
    }
}

/// Body of `GET /progress/{job_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressReport {
    #[serde(default)]
    pub status: Option<RemoteStatus>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub progress: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub remaining_time: Option<f64>,
    #[serde(default)]
    pub chunks: Vec<ChunkReport>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub elapsed_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChunkReport {
    pub chunk_index: u32,
    #[serde(default)]
    pub pages: Vec<u32>,
    pub status: RemoteStatus,
    #[serde(default)]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `{ job_id }` on success, `{ error }` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct TextResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Non-numeric values read as absent instead of failing the whole report.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| value.as_f64()))
}

/// Everything the server needs to start a translation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub source: PathBuf,
    pub pages_per_chunk: u32,
    pub api_key: String,
}

#[derive(Debug)]
pub enum EngineEvent {
    Submitted {
        ticket: u64,
        result: Result<JobId, ServiceError>,
    },
    Progress {
        job_id: JobId,
        result: Result<ProgressReport, ServiceError>,
    },
    Exported {
        job_id: JobId,
        result: Result<ExportSummary, ExportError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ServiceFailure,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFailure {
    InvalidUrl,
    /// The source document could not be read.
    Source,
    HttpStatus(u16),
    /// The server answered with an `{ error }` body.
    Rejected,
    Decode,
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceFailure::InvalidUrl => write!(f, "invalid url"),
            ServiceFailure::Source => write!(f, "unreadable source"),
            ServiceFailure::HttpStatus(code) => write!(f, "http status {code}"),
            ServiceFailure::Rejected => write!(f, "rejected by server"),
            ServiceFailure::Decode => write!(f, "malformed response"),
            ServiceFailure::Timeout => write!(f, "timeout"),
            ServiceFailure::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            ServiceFailure::Network => write!(f, "network error"),
        }
    }
}
