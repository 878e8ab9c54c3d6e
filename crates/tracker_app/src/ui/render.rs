use tracker_core::{ChunkView, ControllerState, ExportState, TrackerViewModel};

use super::presentation::{chunk_badge, controller_badge};

const BAR_WIDTH: usize = 30;
const PREVIEW_CHARS: usize = 60;
const RESULT_PREVIEW_LINES: usize = 8;

/// Lines describing the current view, top to bottom.
pub fn render(view: &TrackerViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    let badge = controller_badge(view.state);

    let mut status = format!("{} {}", badge.symbol, badge.label);
    if let Some(job_id) = &view.job_id {
        status.push_str(&format!(" | job {job_id}"));
    }
    if let Some(source) = &view.source {
        status.push_str(&format!(" | {}", source.display()));
    }
    lines.push(status);

    if matches!(view.state, ControllerState::Tracking | ControllerState::Completed) {
        let mut progress = format!("{} {:5.1}%", progress_bar(view.percent), view.percent);
        if view.state == ControllerState::Tracking {
            progress.push_str(&format!(" | remaining: {}", view.remaining));
        }
        if let Some(total) = view.total_pages {
            progress.push_str(&format!(" | {total} pages"));
        }
        if let Some(elapsed) = view.elapsed_seconds {
            progress.push_str(&format!(" | elapsed {elapsed:.0} s"));
        }
        lines.push(progress);
    }

    lines.extend(view.chunks.iter().map(chunk_line));

    if view.state == ControllerState::Completed {
        if let Some(text) = &view.result_text {
            lines.extend(result_preview(text));
        }
    }

    for warning in &view.warnings {
        lines.push(format!("warning: {warning}"));
    }
    if let Some(error) = &view.error {
        lines.push(format!("error: {error}"));
    }
    match &view.export {
        ExportState::NotRequested => {}
        ExportState::InProgress => lines.push("saving translation...".to_string()),
        ExportState::Written(paths) => {
            for path in paths {
                lines.push(format!("saved {}", path.display()));
            }
        }
        ExportState::Failed(message) => lines.push(format!("error: saving failed: {message}")),
    }
    lines
}

fn chunk_line(chunk: &ChunkView) -> String {
    let badge = chunk_badge(chunk.status);
    let mut line = format!(
        "  {} Part {}{} {}",
        badge.symbol,
        chunk.index + 1,
        page_range(&chunk.pages),
        badge.label
    );
    if let Some(text) = &chunk.translated_text {
        line.push_str(&format!(": {}", preview(text)));
    } else if let Some(error) = &chunk.error {
        line.push_str(&format!(": {error}"));
    }
    line
}

fn result_preview(text: &str) -> Vec<String> {
    let mut lines = vec!["translation:".to_string()];
    let mut body = text.lines().filter(|line| !line.trim().is_empty());
    lines.extend(
        body.by_ref()
            .take(RESULT_PREVIEW_LINES)
            .map(|line| format!("  | {line}")),
    );
    if body.next().is_some() {
        lines.push("  | ...".to_string());
    }
    lines
}

fn page_range(pages: &[u32]) -> String {
    match (pages.first(), pages.last()) {
        (Some(first), Some(last)) if first == last => format!(" (page {first})"),
        (Some(first), Some(last)) => format!(" (pages {first}-{last})"),
        _ => String::new(),
    }
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{cut}...")
}
