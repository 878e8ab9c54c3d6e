use tracker_core::{ChunkStatus, ControllerState};

/// How a status is shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub symbol: &'static str,
    pub label: &'static str,
}

const CHUNK_BADGES: [(ChunkStatus, Badge); 4] = [
    (ChunkStatus::Pending, Badge { symbol: "·", label: "waiting" }),
    (ChunkStatus::InProgress, Badge { symbol: "…", label: "translating" }),
    (ChunkStatus::Completed, Badge { symbol: "✓", label: "done" }),
    (ChunkStatus::Failed, Badge { symbol: "✗", label: "failed" }),
];

const CONTROLLER_BADGES: [(ControllerState, Badge); 5] = [
    (ControllerState::Idle, Badge { symbol: " ", label: "Idle" }),
    (ControllerState::Uploading, Badge { symbol: "↑", label: "Uploading" }),
    (ControllerState::Tracking, Badge { symbol: "…", label: "Translating" }),
    (ControllerState::Completed, Badge { symbol: "✓", label: "Completed" }),
    (ControllerState::Failed, Badge { symbol: "✗", label: "Failed" }),
];

pub fn chunk_badge(status: ChunkStatus) -> Badge {
    lookup(&CHUNK_BADGES, status)
}

pub fn controller_badge(state: ControllerState) -> Badge {
    lookup(&CONTROLLER_BADGES, state)
}

fn lookup<K: PartialEq + Copy>(table: &[(K, Badge)], key: K) -> Badge {
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, badge)| *badge)
        .unwrap_or(Badge {
            symbol: "?",
            label: "unknown",
        })
}
