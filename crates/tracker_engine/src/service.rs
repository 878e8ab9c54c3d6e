use std::time::Duration;

use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracker_logging::tracker_debug;
use url::Url;

use crate::types::{ErrorBody, TextResponse, UploadResponse};
use crate::{JobId, ProgressReport, ServiceError, ServiceFailure, UploadRequest};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000/";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upload of a large document can take a while; polls use `request_timeout`.
    pub upload_timeout: Duration,
    pub max_artifact_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(300),
            max_artifact_bytes: 200 * 1024 * 1024,
        }
    }
}

/// The translation server, as seen by the tracker.
#[async_trait::async_trait]
pub trait TranslationService: Send + Sync {
    /// Upload the source document and return the server-assigned job id.
    async fn submit(&self, upload: &UploadRequest) -> Result<JobId, ServiceError>;

    async fn progress(&self, job_id: &str) -> Result<ProgressReport, ServiceError>;

    /// Plain-text dump of the finished translation, as assembled by the server.
    async fn text(&self, job_id: &str) -> Result<String, ServiceError>;

    /// Download an artifact referenced by the server, e.g. `pdf_url`.
    async fn artifact(&self, url: &str) -> Result<Vec<u8>, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestService {
    settings: ServiceSettings,
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestService {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ServiceError::new(ServiceFailure::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::new(ServiceFailure::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ServiceError::new(ServiceFailure::InvalidUrl, "base url cannot hold a path")
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        serde_json::from_slice(&body)
            .map_err(|err| ServiceError::new(ServiceFailure::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl TranslationService for ReqwestService {
    async fn submit(&self, upload: &UploadRequest) -> Result<JobId, ServiceError> {
        let bytes = tokio::fs::read(&upload.source).await.map_err(|err| {
            ServiceError::new(
                ServiceFailure::Source,
                format!("{}: {err}", upload.source.display()),
            )
        })?;
        let file_name = upload
            .source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(map_reqwest_error)?;
        let form = Form::new()
            .part("file", part)
            .text("pages_per_chunk", upload.pages_per_chunk.to_string())
            .text("api_key", upload.api_key.clone());

        let url = self.endpoint(&["upload"])?;
        tracker_debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .timeout(self.settings.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        // The server answers `{ error }` with a 4xx status, so read the body first.
        let parsed: UploadResponse = serde_json::from_slice(&body).map_err(|err| {
            if status.is_success() {
                ServiceError::new(ServiceFailure::Decode, err.to_string())
            } else {
                rejection(status, &body)
            }
        })?;
        match (parsed.job_id, parsed.error) {
            (_, Some(error)) => Err(ServiceError::new(ServiceFailure::Rejected, error)),
            (Some(job_id), None) if status.is_success() && !job_id.trim().is_empty() => Ok(job_id),
            _ if !status.is_success() => Err(ServiceError::new(
                ServiceFailure::HttpStatus(status.as_u16()),
                status.to_string(),
            )),
            _ => Err(ServiceError::new(
                ServiceFailure::Decode,
                "upload response carried no job id",
            )),
        }
    }

    async fn progress(&self, job_id: &str) -> Result<ProgressReport, ServiceError> {
        let url = self.endpoint(&["progress", job_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let report: ProgressReport = self.read_json(response).await?;
        match (&report.status, &report.error) {
            (None, Some(error)) => Err(ServiceError::new(ServiceFailure::Rejected, error.clone())),
            _ => Ok(report),
        }
    }

    async fn text(&self, job_id: &str) -> Result<String, ServiceError> {
        let url = self.endpoint(&["text", job_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: TextResponse = self.read_json(response).await?;
        match (body.text, body.error) {
            (_, Some(error)) => Err(ServiceError::new(ServiceFailure::Rejected, error)),
            (Some(text), None) => Ok(text),
            (None, None) => Err(ServiceError::new(
                ServiceFailure::Decode,
                "text response carried no text",
            )),
        }
    }

    async fn artifact(&self, url: &str) -> Result<Vec<u8>, ServiceError> {
        let url = self
            .base_url
            .join(url)
            .map_err(|err| ServiceError::new(ServiceFailure::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(url)
            .timeout(self.settings.upload_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            return Err(rejection(status, &body));
        }

        let max_bytes = self.settings.max_artifact_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ServiceError::new(
                    ServiceFailure::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "artifact too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ServiceError::new(
                    ServiceFailure::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "artifact too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

/// Error for a non-success response, preferring the server's `{ error }` text.
fn rejection(status: StatusCode, body: &[u8]) -> ServiceError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => ServiceError::new(ServiceFailure::Rejected, error),
        Err(_) => ServiceError::new(
            ServiceFailure::HttpStatus(status.as_u16()),
            status.to_string(),
        ),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(ServiceFailure::Timeout, err.to_string());
    }
    ServiceError::new(ServiceFailure::Network, err.to_string())
}
