mod app;
mod cli;
mod config;
mod effects;
mod ui;

use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use tracker_logging::{LogDestination, DEFAULT_LOG_FILE};

use crate::cli::{Cli, LogTarget};
use crate::config::AppSettings;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let settings = match AppSettings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("transtrack error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match app::run(settings) {
        Ok(app::Outcome::Translated) => ExitCode::SUCCESS,
        Ok(app::Outcome::Failed) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("transtrack error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = match cli.log {
        LogTarget::File => LogDestination::File(DEFAULT_LOG_FILE.into()),
        LogTarget::Terminal => LogDestination::Terminal,
        LogTarget::Both => LogDestination::Both(DEFAULT_LOG_FILE.into()),
    };
    tracker_logging::initialize(destination, level);
}
