//! memstats - periodic memory and collection-cycle statistics for a process.
//!
//! The library is built around three steps:
//! - `collector` - reads allocator counters, jemalloc heap stats and the
//!   pause log into a [`Snapshot`]
//! - `storage` - keeps the two most recent snapshots in a [`SnapshotStore`]
//! - `diff` / `report` - turn a snapshot pair into a [`Diff`] and render it
//!
//! `probe` drives the three on a fixed interval.

pub mod collector;
pub mod diff;
pub mod fmt;
pub mod probe;
pub mod report;
pub mod storage;

pub use diff::{Diff, compute_diff};
pub use probe::{Probe, ProbeConfig, ProbeError, ProbeHandle};
pub use storage::{Snapshot, SnapshotStore};

#[cfg(test)]
#[global_allocator]
static TEST_ALLOCATOR: collector::CountingAlloc<tikv_jemallocator::Jemalloc> =
    collector::CountingAlloc::new(tikv_jemallocator::Jemalloc);
