use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracker_core::{SubmitRequest, TrackerSettings, DEFAULT_MAX_POLL_ERRORS, DEFAULT_POLL_INTERVAL};
use tracker_engine::{ServiceSettings, DEFAULT_SERVER_URL};
use tracker_logging::{tracker_info, tracker_warn};

use crate::cli::Cli;

pub const DEFAULT_PAGES_PER_CHUNK: u32 = 10;
/// Lower bound for the configured poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(250);
const DEFAULT_OUTPUT_DIR: &str = "output";

/// Values accepted in the `--config` RON file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server_url: Option<String>,
    pub pages_per_chunk: Option<u32>,
    pub poll_interval_ms: Option<u64>,
    pub max_poll_errors: Option<u32>,
    pub output_dir: Option<PathBuf>,
    pub download_artifact: Option<bool>,
    pub fetch_server_text: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = ron::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        tracker_info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

/// What to do with a finished translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
    pub download_artifact: bool,
    pub fetch_server_text: bool,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub service: ServiceSettings,
    pub tracker: TrackerSettings,
    pub export: ExportSettings,
    pub request: SubmitRequest,
}

impl AppSettings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::merge(cli, file))
    }

    /// Command-line flags override the file, the file overrides defaults.
    pub fn merge(cli: &Cli, file: FileConfig) -> Self {
        let service = ServiceSettings {
            base_url: cli
                .server_url
                .clone()
                .or(file.server_url)
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            ..ServiceSettings::default()
        };
        let tracker = TrackerSettings {
            poll_interval: cli
                .poll_interval_ms
                .or(file.poll_interval_ms)
                .map(Duration::from_millis)
                .map(clamp_poll_interval)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            max_consecutive_poll_errors: cli
                .max_poll_errors
                .or(file.max_poll_errors)
                .unwrap_or(DEFAULT_MAX_POLL_ERRORS),
        };
        let export = ExportSettings {
            output_dir: cli
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            download_artifact: cli.download_pdf || file.download_artifact.unwrap_or(false),
            fetch_server_text: cli.server_text || file.fetch_server_text.unwrap_or(false),
        };
        let request = SubmitRequest {
            source: cli.source.clone(),
            pages_per_chunk: Some(
                cli.pages_per_chunk
                    .or(file.pages_per_chunk)
                    .unwrap_or(DEFAULT_PAGES_PER_CHUNK),
            ),
            api_key: cli.api_key.clone(),
        };
        Self {
            service,
            tracker,
            export,
            request,
        }
    }
}

fn clamp_poll_interval(interval: Duration) -> Duration {
    if interval < MIN_POLL_INTERVAL {
        tracker_warn!(
            "Poll interval {:?} is too short; using {:?}",
            interval,
            MIN_POLL_INTERVAL
        );
        return MIN_POLL_INTERVAL;
    }
    interval
}
