//! Snapshot structure for allocator and collection counters.
//!
//! A snapshot is one point-in-time capture. Gauges (`allocated_live`,
//! `heap_alloc_live`, `heap_object_count`) describe the state at
//! `taken_at`; everything else is a cumulative counter that only grows
//! between captures under normal operation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default capacity of the circular pause log.
///
/// Matches the size of the pause ring kept by the reference runtime. Sources
/// that keep a different ring size report it via
/// [`StatsSource::pause_capacity`](crate::collector::StatsSource::pause_capacity).
pub const DEFAULT_PAUSE_CAPACITY: usize = 256;

/// Returns the ring slot holding the pause of collection cycle `cycle`.
///
/// Cycle `n` lives at `n mod capacity`. `capacity` must be non-zero.
pub fn ring_slot(cycle: u64, capacity: usize) -> usize {
    // The remainder is < capacity, so it fits back into usize.
    (cycle % capacity as u64) as usize
}

/// One capture of memory and collection counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Wall-clock time of the capture.
    pub taken_at: DateTime<Utc>,

    // General allocation statistics
    /// Bytes allocated and not yet freed (gauge).
    pub allocated_live: u64,
    /// Bytes allocated since process start, freed or not.
    pub allocated_total: u64,
    /// Number of allocation calls since process start.
    pub malloc_count: u64,
    /// Number of deallocation calls since process start.
    pub free_count: u64,

    // Heap statistics
    /// Bytes in live heap allocations as seen by the heap allocator (gauge).
    pub heap_alloc_live: u64,
    /// Bytes the heap allocator obtained from the operating system.
    pub heap_from_system: u64,
    /// Number of live heap objects (gauge).
    pub heap_object_count: u64,

    // Collection statistics
    /// Number of completed collection cycles.
    pub gc_count: u64,
    /// Circular log of recent pause durations, see [`ring_slot`].
    pub pause_log: Vec<Duration>,
    /// Sum of all pause durations ever recorded.
    pub pause_total: Duration,
}

impl Snapshot {
    /// Creates a zeroed snapshot whose pause log holds `pause_capacity` entries.
    pub fn with_capacity(pause_capacity: usize) -> Self {
        Self {
            pause_log: vec![Duration::ZERO; pause_capacity],
            ..Self::default()
        }
    }

    /// Number of entries in the pause log.
    pub fn pause_capacity(&self) -> usize {
        self.pause_log.len()
    }

    /// Pause of collection cycle `cycle` as currently stored in the ring.
    ///
    /// Returns zero for an empty log. The value is only meaningful for the
    /// last `pause_capacity()` cycles; older entries have been overwritten.
    pub fn pause_at(&self, cycle: u64) -> Duration {
        if self.pause_log.is_empty() {
            return Duration::ZERO;
        }
        self.pause_log[ring_slot(cycle, self.pause_log.len())]
    }
}
