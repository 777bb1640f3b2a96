//! Two-slot rolling buffer of snapshots.

use crate::collector::StatsSource;
use crate::diff::{Diff, compute_diff};
use crate::storage::Snapshot;

/// Holds the two most recent snapshots read from a [`StatsSource`].
///
/// Slot `next` is overwritten by the next [`collect`](Self::collect). Once
/// both slots have been written, `next` always names the older snapshot and
/// the other slot the newer one.
///
/// The store has a single owner by contract: `collect` takes `&mut self`,
/// and sharing across threads needs external synchronization.
#[derive(Debug)]
pub struct SnapshotStore<S: StatsSource> {
    source: S,
    slots: [Snapshot; 2],
    next: usize,
    has_full_history: bool,
}

impl<S: StatsSource> SnapshotStore<S> {
    /// Creates an empty store reading from `source`.
    ///
    /// Both slots get a pause log sized to `source.pause_capacity()`.
    pub fn new(source: S) -> Self {
        let capacity = source.pause_capacity();
        Self {
            slots: [
                Snapshot::with_capacity(capacity),
                Snapshot::with_capacity(capacity),
            ],
            source,
            next: 0,
            has_full_history: false,
        }
    }

    /// Captures the current counters into the older slot.
    pub fn collect(&mut self) {
        let slot = &mut self.slots[self.next];
        slot.taken_at = self.source.now();
        self.source.read_into(slot);

        self.next = 1 - self.next;
        if self.next == 0 {
            self.has_full_history = true;
        }
    }

    /// Computes the delta between the two held snapshots.
    ///
    /// Shorthand for [`compute_diff`].
    pub fn diff(&self) -> Option<Diff> {
        compute_diff(self)
    }

    /// Whether both slots have been written at least once.
    pub fn has_full_history(&self) -> bool {
        self.has_full_history
    }

    /// Index of the slot the next collect overwrites.
    pub fn next_slot(&self) -> usize {
        self.next
    }

    /// Older snapshot. Zeroed until two collects have happened.
    pub fn previous(&self) -> &Snapshot {
        &self.slots[self.next]
    }

    /// Most recent snapshot. Zeroed until the first collect.
    pub fn current(&self) -> &Snapshot {
        &self.slots[1 - self.next]
    }

    /// `(previous, current)` once both slots hold real captures.
    pub fn pair(&self) -> Option<(&Snapshot, &Snapshot)> {
        self.has_full_history.then(|| (self.previous(), self.current()))
    }

    /// Capacity of the pause log of the underlying source.
    pub fn pause_capacity(&self) -> usize {
        self.source.pause_capacity()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MockSource, mock_time};

    fn counting_source(frames: u64) -> MockSource {
        let mut source = MockSource::new(4);
        for i in 0..frames {
            source = source.frame(|s| {
                s.taken_at = mock_time(i as i64 * 1_000);
                s.malloc_count = i + 1;
            });
        }
        source
    }

    #[test]
    fn new_store_is_empty() {
        let store = SnapshotStore::new(counting_source(0));
        assert!(!store.has_full_history());
        assert_eq!(store.next_slot(), 0);
        assert!(store.pair().is_none());
        assert_eq!(store.current().pause_capacity(), 4);
        assert_eq!(store.previous().pause_capacity(), 4);
    }

    #[test]
    fn first_collect_fills_slot_zero() {
        let mut store = SnapshotStore::new(counting_source(3));
        store.collect();
        assert!(!store.has_full_history());
        assert_eq!(store.next_slot(), 1);
        assert_eq!(store.current().malloc_count, 1);
        assert_eq!(store.current().taken_at, mock_time(0));
    }

    #[test]
    fn second_collect_completes_history() {
        let mut store = SnapshotStore::new(counting_source(3));
        store.collect();
        store.collect();
        assert!(store.has_full_history());
        assert_eq!(store.next_slot(), 0);

        let (prev, cur) = store.pair().unwrap();
        assert_eq!(prev.malloc_count, 1);
        assert_eq!(cur.malloc_count, 2);
    }

    #[test]
    fn next_points_at_older_snapshot_after_wrap() {
        let mut store = SnapshotStore::new(counting_source(5));
        for _ in 0..5 {
            store.collect();
        }
        assert!(store.has_full_history());
        assert_eq!(store.next_slot(), 1);
        assert_eq!(store.previous().malloc_count, 4);
        assert_eq!(store.current().malloc_count, 5);
        assert_eq!(store.current().taken_at, mock_time(4_000));
    }

    #[test]
    fn source_is_reachable() {
        let mut store = SnapshotStore::new(counting_source(2));
        assert_eq!(store.source().remaining(), 2);
        store.collect();
        assert_eq!(store.source_mut().remaining(), 1);
        assert_eq!(store.pause_capacity(), 4);
    }
}
