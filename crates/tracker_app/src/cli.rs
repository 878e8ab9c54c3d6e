use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Upload a PDF to the translation server and follow the job chunk by chunk.
#[derive(Debug, Parser)]
#[command(name = "transtrack", version)]
#[command(about = "Submit a document for translation and track it until it finishes", long_about = None)]
pub struct Cli {
    /// PDF document to translate.
    pub source: Option<PathBuf>,

    /// RON config file; flags given on the command line win over its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the translation server.
    #[arg(long, value_name = "URL")]
    pub server_url: Option<String>,

    /// Pages per chunk (must be at least 1).
    #[arg(long, value_name = "N")]
    pub pages_per_chunk: Option<u32>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Consecutive failed polls before giving up; 0 polls forever.
    #[arg(long, value_name = "N")]
    pub max_poll_errors: Option<u32>,

    /// Directory for the translated text and other downloads.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also download the translated PDF when the server provides one.
    #[arg(long)]
    pub download_pdf: bool,

    /// Also save the server's own text dump of the translation.
    #[arg(long)]
    pub server_text: bool,

    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    /// Log at debug level.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}
