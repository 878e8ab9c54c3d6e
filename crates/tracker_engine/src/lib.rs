//! Tracker engine: server IO, polling and result export.
mod engine;
mod export;
mod filename;
mod persist;
mod poller;
mod service;
mod types;

pub use engine::{EngineError, EngineHandle};
pub use export::{export_result, ExportError, ExportRequest, ExportSummary};
pub use filename::{job_file_stem, sha256_hex};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use poller::{Poller, Tagged};
pub use service::{ReqwestService, ServiceSettings, TranslationService, DEFAULT_SERVER_URL};
pub use types::{
    ChunkReport, EngineEvent, JobId, ProgressReport, RemoteStatus, ServiceError, ServiceFailure,
    UploadRequest,
};
