//! Queue Statistics Module
//!
//! Per-status item counts for one queue or aggregated across all queues.
//! Items are retained after reaching a terminal state, so the counts sum to
//! everything ever enqueued.

use serde::Serialize;

use crate::queue::ItemStatus;

// == Queue Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStats {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub failed: u64,
    pub dead: u64,
}

impl QueueStats {
    /// Creates a new QueueStats with all counts at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one item in the given status to the counts.
    pub fn count(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Pending => self.pending += 1,
            ItemStatus::InProgress => self.in_progress += 1,
            ItemStatus::Completed => self.completed += 1,
            ItemStatus::Failed => self.failed += 1,
            ItemStatus::Dead => self.dead += 1,
        }
    }

    /// Total items represented by these counts.
    pub fn total(&self) -> u64 {
        self.pending + self.in_progress + self.completed + self.failed + self.dead
    }
}
