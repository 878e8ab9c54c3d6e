use std::path::PathBuf;

use crate::{ChunkIndex, ChunkState, ChunkStatus, ControllerState, JobId, RemainingTime, TrackerError};

/// Progress of handing the finished result to the export collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportState {
    #[default]
    NotRequested,
    InProgress,
    Written(Vec<PathBuf>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerViewModel {
    pub state: ControllerState,
    pub job_id: Option<JobId>,
    pub source: Option<PathBuf>,
    pub percent: f64,
    pub remaining: RemainingTime,
    pub total_pages: Option<u32>,
    pub elapsed_seconds: Option<f64>,
    pub chunks: Vec<ChunkView>,
    pub result_text: Option<String>,
    pub artifact_url: Option<String>,
    pub error: Option<TrackerError>,
    pub warnings: Vec<String>,
    pub export: ExportState,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkView {
    pub index: ChunkIndex,
    pub pages: Vec<u32>,
    pub status: ChunkStatus,
    pub translated_text: Option<String>,
    pub error: Option<String>,
}

impl From<&ChunkState> for ChunkView {
    fn from(chunk: &ChunkState) -> Self {
        Self {
            index: chunk.index(),
            pages: chunk.pages().to_vec(),
            status: chunk.status(),
            translated_text: chunk.translated_text().map(ToOwned::to_owned),
            error: chunk.error_message().map(ToOwned::to_owned),
        }
    }
}
