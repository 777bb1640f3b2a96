//! Abstraction over where counter values come from.
//!
//! The `StatsSource` trait lets the snapshot store read from the live
//! process allocator or from a scripted implementation for testing.

use chrono::{DateTime, Utc};

use crate::storage::Snapshot;

/// Source of allocator and collection counters.
///
/// Implementations fill a [`Snapshot`] in place so that a store can reuse
/// its two slots (and their pause log buffers) for the lifetime of the
/// process.
pub trait StatsSource: Send {
    /// Capacity of the circular pause log kept by this source.
    ///
    /// This is a property of the environment being observed; snapshots
    /// handed to [`read_into`](Self::read_into) have a pause log of exactly
    /// this length.
    fn pause_capacity(&self) -> usize;

    /// Current wall-clock time used to stamp a capture.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Reads the current counters into `snapshot`.
    ///
    /// Must not touch `snapshot.taken_at`, which the caller stamps from
    /// [`now`](Self::now) right before the read. Reading is infallible from
    /// the caller's point of view: a counter that cannot be read keeps its
    /// previous value.
    fn read_into(&mut self, snapshot: &mut Snapshot);
}
