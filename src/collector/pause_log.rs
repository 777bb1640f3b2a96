//! Fixed-capacity circular log of collection pauses.

use std::time::Duration;

use crate::storage::Snapshot;
use crate::storage::snapshot::ring_slot;

/// Record of completed collection cycles and their pause durations.
///
/// The pause of cycle `n` (counting from 1) is stored at slot
/// `n mod capacity`, so once more than `capacity` cycles have run the
/// oldest entries are silently overwritten. The cycle count and the total
/// pause time are never truncated.
#[derive(Clone, Debug, PartialEq)]
pub struct PauseLog {
    pauses: Vec<Duration>,
    cycles: u64,
    total: Duration,
}

impl PauseLog {
    /// Creates an empty log with room for `capacity` pauses.
    pub fn new(capacity: usize) -> Self {
        Self {
            pauses: vec![Duration::ZERO; capacity],
            cycles: 0,
            total: Duration::ZERO,
        }
    }

    pub fn capacity(&self) -> usize {
        self.pauses.len()
    }

    /// Completed cycles since the log was created.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Sum of all recorded pauses.
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Records the pause of one completed cycle.
    pub fn record(&mut self, pause: Duration) {
        self.cycles += 1;
        self.total = self.total.saturating_add(pause);
        if !self.pauses.is_empty() {
            let slot = ring_slot(self.cycles, self.pauses.len());
            self.pauses[slot] = pause;
        }
    }

    /// Copies the cycle count, total and ring into `snapshot`.
    ///
    /// Reuses the snapshot's pause buffer when the capacities match.
    pub fn copy_into(&self, snapshot: &mut Snapshot) {
        snapshot.gc_count = self.cycles;
        snapshot.pause_total = self.total;
        snapshot.pause_log.clone_from(&self.pauses);
    }
}
