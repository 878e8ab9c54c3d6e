use std::path::PathBuf;

use serde_json::json;
use tracker_logging::{tracker_info, tracker_warn};

use crate::filename::{job_file_stem, sha256_hex};
use crate::persist::{AtomicFileWriter, PersistError};
use crate::service::TranslationService;
use crate::ServiceError;

/// What to write once a job has completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Text assembled from the completed chunks.
    pub text: String,
    pub artifact_url: Option<String>,
    pub output_dir: PathBuf,
    pub download_artifact: bool,
    pub fetch_server_text: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub text_path: PathBuf,
    pub artifact_path: Option<PathBuf>,
    pub server_text_path: Option<PathBuf>,
    pub manifest_path: PathBuf,
}

impl ExportSummary {
    /// Every file written, in the order they were written.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.text_path.clone()];
        paths.extend(self.artifact_path.iter().cloned());
        paths.extend(self.server_text_path.iter().cloned());
        paths.push(self.manifest_path.clone());
        paths
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

/// Write the translated text, then the optional extras, then a manifest.
///
/// The text file is the result; a failed artifact download or server text
/// fetch is logged and left out of the summary. A failure writing the text
/// or the manifest fails the export.
pub async fn export_result(
    service: &dyn TranslationService,
    job_id: &str,
    request: &ExportRequest,
) -> Result<ExportSummary, ExportError> {
    let writer = AtomicFileWriter::new(request.output_dir.clone());
    let stem = job_file_stem(job_id);

    let text_name = format!("{stem}_translated.txt");
    let text_path = writer.write(&text_name, &request.text)?;
    tracker_info!("Wrote translation to {}", text_path.display());
    let mut files = vec![json!({
        "kind": "translation",
        "filename": text_name,
        "bytes": request.text.len(),
        "sha256": sha256_hex(request.text.as_bytes()),
    })];

    let mut artifact_path = None;
    match (&request.artifact_url, request.download_artifact) {
        (Some(url), true) => match service.artifact(url).await {
            Ok(bytes) => {
                let name = format!("{stem}_translated.pdf");
                let path = writer.write_bytes(&name, &bytes)?;
                files.push(json!({
                    "kind": "artifact",
                    "filename": name,
                    "source": url,
                    "bytes": bytes.len(),
                    "sha256": sha256_hex(&bytes),
                }));
                artifact_path = Some(path);
            }
            Err(err) => tracker_warn!("Artifact download for job {} failed: {}", job_id, err),
        },
        (None, true) => tracker_warn!("Job {} finished without an artifact url", job_id),
        (_, false) => {}
    }

    let mut server_text_path = None;
    if request.fetch_server_text {
        match service.text(job_id).await {
            Ok(text) => {
                let name = format!("{stem}_server.txt");
                let path = writer.write(&name, &text)?;
                if text != request.text {
                    tracker_warn!(
                        "Server text for job {} differs from the assembled chunks",
                        job_id
                    );
                }
                files.push(json!({
                    "kind": "server_text",
                    "filename": name,
                    "bytes": text.len(),
                    "sha256": sha256_hex(text.as_bytes()),
                }));
                server_text_path = Some(path);
            }
            Err(err) => tracker_warn!("Server text for job {} unavailable: {}", job_id, err),
        }
    }

    let manifest = json!({
        "job_id": job_id,
        "files": files,
    });
    let manifest_path = writer.write(&format!("{stem}_manifest.json"), &manifest.to_string())?;

    Ok(ExportSummary {
        text_path,
        artifact_path,
        server_text_path,
        manifest_path,
    })
}
