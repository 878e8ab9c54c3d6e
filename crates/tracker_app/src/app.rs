use std::io::{self, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracker_core::{update, ControllerState, ExportState, Msg, TrackerState};
use tracker_engine::EngineHandle;
use tracker_logging::tracker_info;

use crate::config::AppSettings;
use crate::effects::EffectRunner;
use crate::ui;

const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Translated,
    Failed,
}

/// Submit the configured document and drive the tracker until the job ends.
pub fn run(settings: AppSettings) -> Result<Outcome> {
    let (engine, events) = EngineHandle::from_settings(settings.service.clone())
        .with_context(|| format!("connecting to {}", settings.service.base_url))?;
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(engine, events, settings.export.clone(), msg_tx.clone());

    let tick_tx = msg_tx.clone();
    thread::spawn(move || {
        while tick_tx.send(Msg::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    msg_tx
        .send(Msg::StartRequested(settings.request))
        .context("message loop closed before start")?;
    drop(msg_tx);

    let mut state = TrackerState::with_settings(settings.tracker);
    let stdout = io::stdout();
    while let Ok(msg) = msg_rx.recv() {
        let (next, effects) = update(state, msg);
        state = next;
        runner.enqueue(effects);

        if state.consume_dirty() {
            let mut out = stdout.lock();
            for line in ui::render::render(&state.view()) {
                writeln!(out, "{line}")?;
            }
            writeln!(out)?;
        }

        if let Some(outcome) = outcome(&state) {
            tracker_info!("Tracker finished: {:?}", outcome);
            if let Some(result) = state.result() {
                if outcome == Outcome::Translated {
                    tracker_info!(
                        "{} chunks translated, {} missing",
                        result.contributing,
                        result.missing.len()
                    );
                }
            }
            return Ok(outcome);
        }
    }
    anyhow::bail!("message loop ended unexpectedly")
}

/// `Some` once nothing more will happen for this run.
fn outcome(state: &TrackerState) -> Option<Outcome> {
    match state.controller_state() {
        ControllerState::Idle if state.last_error().is_some() => Some(Outcome::Failed),
        ControllerState::Failed => Some(Outcome::Failed),
        ControllerState::Completed => match state.export() {
            ExportState::Written(_) => Some(Outcome::Translated),
            ExportState::Failed(_) => Some(Outcome::Failed),
            ExportState::NotRequested | ExportState::InProgress => None,
        },
        ControllerState::Idle | ControllerState::Uploading | ControllerState::Tracking => None,
    }
}
