use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tracker_engine::{
    EngineEvent, EngineHandle, ExportRequest, JobId, ProgressReport, RemoteStatus, ServiceError,
    ServiceFailure, TranslationService, UploadRequest,
};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct ScriptedService {
    polls: AtomicUsize,
}

#[async_trait::async_trait]
impl TranslationService for ScriptedService {
    async fn submit(&self, upload: &UploadRequest) -> Result<JobId, ServiceError> {
        if upload.api_key.is_empty() {
            return Err(ServiceError::new(ServiceFailure::Rejected, "API key is required"));
        }
        Ok("job-1".to_string())
    }

    async fn progress(&self, _job_id: &str) -> Result<ProgressReport, ServiceError> {
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(ProgressReport {
            status: Some(RemoteStatus::InProgress),
            progress: Some(n as f64),
            remaining_time: None,
            chunks: Vec::new(),
            pdf_url: None,
            error: None,
            total_pages: None,
            elapsed_time: None,
        })
    }

    async fn text(&self, _job_id: &str) -> Result<String, ServiceError> {
        Ok(String::new())
    }

    async fn artifact(&self, _url: &str) -> Result<Vec<u8>, ServiceError> {
        Ok(Vec::new())
    }
}

fn upload(api_key: &str) -> UploadRequest {
    UploadRequest {
        source: PathBuf::from("book.pdf"),
        pages_per_chunk: 10,
        api_key: api_key.to_string(),
    }
}

#[test]
fn submit_results_carry_their_ticket() {
    let (engine, events) = EngineHandle::new(Arc::new(ScriptedService::default())).unwrap();

    engine.submit(7, upload("key"));
    match events.recv_timeout(WAIT).unwrap() {
        EngineEvent::Submitted { ticket, result } => {
            assert_eq!(ticket, 7);
            assert_eq!(result.unwrap(), "job-1");
        }
        other => panic!("unexpected event {other:?}"),
    }

    engine.submit(8, upload(""));
    match events.recv_timeout(WAIT).unwrap() {
        EngineEvent::Submitted { ticket, result } => {
            assert_eq!(ticket, 8);
            assert_eq!(result.unwrap_err().message, "API key is required");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn polling_delivers_tagged_progress_until_stopped() {
    let service = Arc::new(ScriptedService::default());
    let (engine, events) = EngineHandle::new(service.clone()).unwrap();

    engine.start_polling("job-1".to_string(), Duration::from_millis(10));
    for _ in 0..3 {
        match events.recv_timeout(WAIT).unwrap() {
            EngineEvent::Progress { job_id, result } => {
                assert_eq!(job_id, "job-1");
                assert!(result.is_ok());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    engine.stop_polling();
    std::thread::sleep(Duration::from_millis(100));
    while events.try_recv().is_ok() {}
    let polls = service.polls.load(Ordering::SeqCst);
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(service.polls.load(Ordering::SeqCst), polls);
    assert!(events.try_recv().is_err());
}

#[test]
fn export_reports_written_files() {
    let temp = TempDir::new().unwrap();
    let (engine, events) = EngineHandle::new(Arc::new(ScriptedService::default())).unwrap();

    engine.export(
        "job-1".to_string(),
        ExportRequest {
            text: "A".to_string(),
            artifact_url: None,
            output_dir: temp.path().to_path_buf(),
            download_artifact: false,
            fetch_server_text: false,
        },
    );
    match events.recv_timeout(WAIT).unwrap() {
        EngineEvent::Exported { job_id, result } => {
            assert_eq!(job_id, "job-1");
            let summary = result.unwrap();
            assert_eq!(summary.text_path, temp.path().join("job-1_translated.txt"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}
