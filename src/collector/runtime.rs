//! Statistics source backed by the live process allocator.
//!
//! Combines three feeds into one snapshot:
//! - [`CountingAlloc`](super::CountingAlloc) counters (bytes, calls, live objects)
//! - jemalloc `stats.allocated` / `stats.mapped` (heap view)
//! - the [`PauseLog`] shared with a [`Reclaimer`](super::Reclaimer)

use std::sync::{Arc, Mutex, PoisonError};

use tikv_jemalloc_ctl::{epoch, epoch_mib, stats};
use tracing::warn;

use crate::collector::alloc::alloc_counters;
use crate::collector::pause_log::PauseLog;
use crate::collector::traits::StatsSource;
use crate::storage::Snapshot;

/// Heap counters read from jemalloc.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HeapStats {
    /// Bytes in live allocations (`stats.allocated`).
    pub allocated: u64,
    /// Bytes mapped from the operating system (`stats.mapped`).
    pub mapped: u64,
}

/// Pre-resolved jemalloc MIBs; stats are cached until the epoch advances.
struct JemallocStats {
    epoch: epoch_mib,
    allocated: stats::allocated_mib,
    mapped: stats::mapped_mib,
}

impl JemallocStats {
    fn new() -> Result<Self, tikv_jemalloc_ctl::Error> {
        Ok(Self {
            epoch: epoch::mib()?,
            allocated: stats::allocated::mib()?,
            mapped: stats::mapped::mib()?,
        })
    }

    fn read(&self) -> Result<HeapStats, tikv_jemalloc_ctl::Error> {
        self.epoch.advance()?;
        Ok(HeapStats {
            allocated: self.allocated.read()? as u64,
            mapped: self.mapped.read()? as u64,
        })
    }
}

/// Reads counters from the running process.
///
/// Created through [`Reclaimer::source`](super::Reclaimer::source) so that
/// the pause log it reports is the one collection cycles are recorded in.
pub struct RuntimeSource {
    pauses: Arc<Mutex<PauseLog>>,
    jemalloc: Option<JemallocStats>,
    pause_capacity: usize,
}

impl std::fmt::Debug for RuntimeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeSource")
            .field("pause_capacity", &self.pause_capacity)
            .field("jemalloc", &self.jemalloc.is_some())
            .finish()
    }
}

impl RuntimeSource {
    pub(crate) fn new(pauses: Arc<Mutex<PauseLog>>) -> Self {
        let pause_capacity = pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity();

        let jemalloc = match JemallocStats::new() {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("jemalloc stats unavailable, heap counters stay at zero: {}", e);
                None
            }
        };

        Self {
            pauses,
            jemalloc,
            pause_capacity,
        }
    }

    /// Whether heap counters are read from jemalloc.
    pub fn has_heap_stats(&self) -> bool {
        self.jemalloc.is_some()
    }
}

impl StatsSource for RuntimeSource {
    fn pause_capacity(&self) -> usize {
        self.pause_capacity
    }

    fn read_into(&mut self, snapshot: &mut Snapshot) {
        let counters = alloc_counters();
        snapshot.allocated_live = counters.live_bytes();
        snapshot.allocated_total = counters.allocated_bytes;
        snapshot.malloc_count = counters.allocs;
        snapshot.free_count = counters.frees;
        snapshot.heap_object_count = counters.live_objects();

        if let Some(ref stats) = self.jemalloc {
            match stats.read() {
                Ok(heap) => {
                    snapshot.heap_alloc_live = heap.allocated;
                    snapshot.heap_from_system = heap.mapped;
                }
                Err(e) => warn!("jemalloc stats read failed: {}", e),
            }
        }

        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .copy_into(snapshot);
    }
}
