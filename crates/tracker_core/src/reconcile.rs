//! Merging server chunk snapshots into the local chunk collection.
//!
//! Snapshots may be partial, duplicated or arrive out of order. Merging never
//! removes a chunk and never moves a chunk backwards in its status order, so
//! applying the same snapshot twice is the same as applying it once.
use std::cmp::Ordering;
use std::collections::btree_map::Entry;

use crate::state::{ChunkIndex, ChunkMap, ChunkSnapshot, ChunkState, ChunkStatus};

/// Message stored for a failed chunk that came without one.
pub const UNKNOWN_CHUNK_ERROR: &str = "Unknown error";

/// What applying one incoming chunk did to the local chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkChange {
    /// First appearance of the index.
    Created,
    /// Status moved strictly forward.
    Advanced { from: ChunkStatus, to: ChunkStatus },
    /// Same status, some field was updated.
    Refreshed,
    Unchanged,
    /// The incoming status would regress the chunk; nothing was touched.
    Ignored,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<ChunkIndex>,
    pub advanced: Vec<ChunkIndex>,
    pub refreshed: Vec<ChunkIndex>,
    pub ignored: Vec<ChunkIndex>,
    /// Chunks that entered `Failed` during this merge.
    pub newly_failed: Vec<ChunkIndex>,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        !(self.created.is_empty() && self.advanced.is_empty() && self.refreshed.is_empty())
    }

    fn record(&mut self, index: ChunkIndex, change: ChunkChange, status: ChunkStatus) {
        match change {
            ChunkChange::Created => self.created.push(index),
            ChunkChange::Advanced { .. } => self.advanced.push(index),
            ChunkChange::Refreshed => self.refreshed.push(index),
            ChunkChange::Ignored => self.ignored.push(index),
            ChunkChange::Unchanged => {}
        }
        let entered_failed = match change {
            ChunkChange::Created => status == ChunkStatus::Failed,
            ChunkChange::Advanced { to, .. } => to == ChunkStatus::Failed,
            _ => false,
        };
        if entered_failed {
            self.newly_failed.push(index);
        }
    }
}

/// Merge `incoming` into `chunks` in place.
pub fn reconcile(chunks: &mut ChunkMap, incoming: &[ChunkSnapshot]) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for snapshot in incoming {
        let (change, status) = match chunks.entry(snapshot.index) {
            Entry::Vacant(slot) => {
                let chunk = slot.insert(ChunkState::pending(snapshot.index, snapshot.pages.clone()));
                chunk.apply(snapshot);
                (ChunkChange::Created, chunk.status)
            }
            Entry::Occupied(mut slot) => {
                let chunk = slot.get_mut();
                (chunk.apply(snapshot), chunk.status)
            }
        };
        report.record(snapshot.index, change, status);
    }
    report
}

impl ChunkState {
    pub(crate) fn apply(&mut self, incoming: &ChunkSnapshot) -> ChunkChange {
        match incoming.status.partial_cmp(&self.status) {
            // Regression, or completed <-> failed which are incomparable.
            Some(Ordering::Less) | None => ChunkChange::Ignored,
            Some(Ordering::Equal) => {
                if self.absorb_fields(incoming) {
                    ChunkChange::Refreshed
                } else {
                    ChunkChange::Unchanged
                }
            }
            Some(Ordering::Greater) => {
                let from = self.status;
                self.status = incoming.status;
                self.absorb_fields(incoming);
                ChunkChange::Advanced {
                    from,
                    to: incoming.status,
                }
            }
        }
    }

    /// Copy the fields that belong to the current status; returns true on change.
    fn absorb_fields(&mut self, incoming: &ChunkSnapshot) -> bool {
        let mut changed = false;
        // Pages are fixed at first sight unless the first snapshot had none.
        if self.pages.is_empty() && !incoming.pages.is_empty() {
            self.pages = incoming.pages.clone();
            changed = true;
        }

        let (text, error) = match self.status {
            ChunkStatus::Completed => {
                let text = incoming
                    .translated_text
                    .clone()
                    .or_else(|| self.translated_text.clone())
                    .unwrap_or_default();
                (Some(text), None)
            }
            ChunkStatus::Failed => {
                let error = incoming
                    .error
                    .clone()
                    .or_else(|| self.error_message.clone())
                    .unwrap_or_else(|| UNKNOWN_CHUNK_ERROR.to_string());
                (None, Some(error))
            }
            ChunkStatus::Pending | ChunkStatus::InProgress => (None, None),
        };

        if self.translated_text != text {
            self.translated_text = text;
            changed = true;
        }
        if self.error_message != error {
            self.error_message = error;
            changed = true;
        }
        changed
    }
}
