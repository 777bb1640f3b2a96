//! Delta computation between two consecutive snapshots.
//!
//! Gauges are taken from the newer snapshot as-is; monotonic counters are
//! diffed by subtraction. The pause history of the interval is rebuilt from
//! the newer snapshot's circular pause log, which is the most complete view
//! available: the older snapshot's log is a stale subset of the same ring.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::collector::StatsSource;
use crate::storage::{Snapshot, SnapshotStore};

/// Delta between two snapshots plus the recent pause history.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diff {
    /// Wall time between the two captures.
    pub elapsed: Duration,

    // General statistics
    /// Bytes allocated and still in use at the newer capture.
    pub live_bytes: u64,
    /// Bytes allocated during the interval (even if freed).
    pub total_allocated: u64,
    /// Allocation calls during the interval.
    pub mallocs: u64,
    /// Deallocation calls during the interval.
    pub frees: u64,

    // Heap statistics
    /// Heap bytes still in use at the newer capture.
    pub heap_live_bytes: u64,
    /// Heap bytes obtained from the system during the interval.
    pub heap_system_bytes: u64,
    /// Live heap objects at the newer capture.
    pub heap_objects: u64,

    // Collection statistics
    /// Pause time accumulated during the interval.
    pub pause_total: Duration,
    /// Pauses of the interval, most recent first.
    pub pauses: Vec<Duration>,
    /// Some pauses of the interval were overwritten before being read.
    pub pauses_missing: bool,
    /// Collection cycles completed during the interval.
    pub gc_count_delta: u64,
}

impl Diff {
    /// Allocated bytes per second, `None` when no time elapsed.
    pub fn alloc_rate(&self) -> Option<f64> {
        self.per_second(self.total_allocated)
    }

    /// Live heap objects per second, `None` when no time elapsed.
    pub fn object_rate(&self) -> Option<f64> {
        self.per_second(self.heap_objects)
    }

    /// Mean pause of the interval's cycles, `None` without cycles.
    pub fn mean_pause(&self) -> Option<Duration> {
        if self.gc_count_delta == 0 {
            return None;
        }
        let nanos = self.pause_total.as_nanos() / u128::from(self.gc_count_delta);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    fn per_second(&self, value: u64) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| value as f64 / secs)
    }
}

/// Computes the delta between the two snapshots held by `store`.
///
/// Returns `None` when the store holds fewer than two captures or when the
/// wall clock went backwards between them. Both cases resolve themselves on
/// a later tick.
pub fn compute_diff<S: StatsSource>(store: &SnapshotStore<S>) -> Option<Diff> {
    let Some((previous, current)) = store.pair() else {
        debug!("diff skipped: only one sample collected");
        return None;
    };
    diff_snapshots(previous, current)
}

/// Computes the delta from `previous` to `current`.
///
/// Returns `None` if `current` was taken before `previous`.
pub fn diff_snapshots(previous: &Snapshot, current: &Snapshot) -> Option<Diff> {
    let Ok(elapsed) = (current.taken_at - previous.taken_at).to_std() else {
        debug!(
            "diff skipped: clock went backwards ({} -> {})",
            previous.taken_at, current.taken_at
        );
        return None;
    };

    let gc_count_delta = current.gc_count.saturating_sub(previous.gc_count);
    let capacity = current.pause_capacity() as u64;

    Some(Diff {
        elapsed,
        live_bytes: current.allocated_live,
        total_allocated: current
            .allocated_total
            .saturating_sub(previous.allocated_total),
        mallocs: current.malloc_count.saturating_sub(previous.malloc_count),
        frees: current.free_count.saturating_sub(previous.free_count),
        heap_live_bytes: current.heap_alloc_live,
        heap_system_bytes: current
            .heap_from_system
            .saturating_sub(previous.heap_from_system),
        heap_objects: current.heap_object_count,
        pause_total: current.pause_total.saturating_sub(previous.pause_total),
        pauses: recent_pauses(current, gc_count_delta),
        pauses_missing: gc_count_delta > capacity,
        gc_count_delta,
    })
}

/// The last `min(count, capacity)` pauses of `snapshot`, most recent first.
fn recent_pauses(snapshot: &Snapshot, count: u64) -> Vec<Duration> {
    let n = count.min(snapshot.pause_capacity() as u64);
    // n <= count <= gc_count, so the subtraction cannot underflow.
    (0..n)
        .map(|i| snapshot.pause_at(snapshot.gc_count - i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MockSource, mock_time};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn collected(source: MockSource, ticks: usize) -> SnapshotStore<MockSource> {
        let mut store = SnapshotStore::new(source);
        for _ in 0..ticks {
            store.collect();
        }
        store
    }

    fn pair(capacity: usize) -> (Snapshot, Snapshot) {
        let mut previous = Snapshot::with_capacity(capacity);
        previous.taken_at = mock_time(0);
        let mut current = Snapshot::with_capacity(capacity);
        current.taken_at = mock_time(1_000);
        (previous, current)
    }

    #[test]
    fn single_sample_is_not_enough() {
        let store = collected(MockSource::five_second_tick(), 1);
        assert!(compute_diff(&store).is_none());
    }

    #[test]
    fn empty_store_is_not_enough() {
        let store = collected(MockSource::five_second_tick(), 0);
        assert!(compute_diff(&store).is_none());
    }

    #[test]
    fn two_samples_produce_diff() {
        let store = collected(MockSource::five_second_tick(), 2);
        let diff = compute_diff(&store).unwrap();
        assert_eq!(diff.elapsed, Duration::from_secs(5));
        assert_eq!(diff.total_allocated, 200_000);
        assert_eq!(diff.live_bytes, 600_000);
        assert_eq!(diff.mallocs, 2_000);
        assert_eq!(diff.frees, 1_500);
        assert_eq!(diff.heap_live_bytes, 590_000);
        assert_eq!(diff.heap_system_bytes, 2_097_152);
        assert_eq!(diff.heap_objects, 1_500);
        assert_eq!(diff.gc_count_delta, 1);
        assert_eq!(diff.pause_total, ms(2));
        assert_eq!(diff.pauses, vec![ms(2)]);
        assert!(!diff.pauses_missing);
        assert_eq!(store.diff(), Some(diff));
    }

    #[test]
    fn real_clock_elapsed_matches_wall_time() {
        let reclaimer = crate::collector::Reclaimer::new(8);
        let mut store = SnapshotStore::new(reclaimer.source());
        let start = chrono::Utc::now();
        store.collect();
        std::thread::sleep(Duration::from_millis(50));
        store.collect();
        let end = chrono::Utc::now();

        let diff = compute_diff(&store).unwrap();
        let upper = (end - start).to_std().unwrap();
        assert!(diff.elapsed >= Duration::from_millis(45));
        assert!(diff.elapsed <= upper);
    }

    #[test]
    fn counter_deltas_subtract_previous() {
        let (mut previous, mut current) = pair(8);
        previous.allocated_total = 400;
        current.allocated_total = 1000;
        previous.malloc_count = 400;
        current.malloc_count = 1000;
        previous.free_count = 400;
        current.free_count = 1000;
        previous.heap_from_system = 400;
        current.heap_from_system = 1000;
        previous.gc_count = 400;
        current.gc_count = 1000;
        previous.pause_total = Duration::from_nanos(400);
        current.pause_total = Duration::from_nanos(1000);

        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(diff.total_allocated, 600);
        assert_eq!(diff.mallocs, 600);
        assert_eq!(diff.frees, 600);
        assert_eq!(diff.heap_system_bytes, 600);
        assert_eq!(diff.gc_count_delta, 600);
        assert_eq!(diff.pause_total, Duration::from_nanos(600));
    }

    #[test]
    fn gauges_come_from_current() {
        let (mut previous, mut current) = pair(8);
        previous.allocated_live = 900;
        current.allocated_live = 100;
        previous.heap_alloc_live = 900;
        current.heap_alloc_live = 200;
        previous.heap_object_count = 900;
        current.heap_object_count = 300;

        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(diff.live_bytes, 100);
        assert_eq!(diff.heap_live_bytes, 200);
        assert_eq!(diff.heap_objects, 300);
    }

    #[test]
    fn counter_regression_saturates_to_zero() {
        let (mut previous, mut current) = pair(8);
        previous.allocated_total = 1000;
        current.allocated_total = 10;
        previous.gc_count = 5;
        current.gc_count = 2;

        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(diff.total_allocated, 0);
        assert_eq!(diff.gc_count_delta, 0);
        assert!(diff.pauses.is_empty());
    }

    #[test]
    fn wraparound_without_loss() {
        let store = collected(MockSource::wrapping_pauses(), 2);
        let diff = compute_diff(&store).unwrap();
        assert_eq!(diff.gc_count_delta, 3);
        assert_eq!(diff.pauses, vec![ms(5), ms(3), ms(9)]);
        assert!(!diff.pauses_missing);
        assert_eq!(diff.pause_total, ms(17));
    }

    #[test]
    fn wraparound_with_loss() {
        let store = collected(MockSource::lost_pauses(), 2);
        let diff = compute_diff(&store).unwrap();
        assert_eq!(diff.gc_count_delta, 10);
        assert_eq!(diff.pauses.len(), 8);
        assert!(diff.pauses_missing);
        // gc_count = 20 sits at slot 4, then walks backwards through the ring.
        assert_eq!(
            diff.pauses,
            vec![ms(5), ms(4), ms(3), ms(2), ms(1), ms(8), ms(7), ms(6)]
        );
    }

    #[test]
    fn delta_equal_to_capacity_is_complete() {
        let (mut previous, mut current) = pair(4);
        previous.gc_count = 4;
        current.gc_count = 8;
        current.pause_log = vec![ms(8), ms(5), ms(6), ms(7)];

        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(diff.pauses, vec![ms(8), ms(7), ms(6), ms(5)]);
        assert!(!diff.pauses_missing);
    }

    #[test]
    fn no_cycles_means_no_pauses() {
        let (mut previous, mut current) = pair(8);
        previous.gc_count = 7;
        current.gc_count = 7;
        current.pause_log[7] = ms(1);

        let diff = diff_snapshots(&previous, &current).unwrap();
        assert_eq!(diff.gc_count_delta, 0);
        assert!(diff.pauses.is_empty());
        assert!(!diff.pauses_missing);
        assert_eq!(diff.mean_pause(), None);
    }

    #[test]
    fn clock_regression_is_rejected() {
        let store = collected(MockSource::clock_regression(), 2);
        assert!(compute_diff(&store).is_none());
    }

    #[test]
    fn clock_regression_recovers_on_next_tick() {
        let source = MockSource::clock_regression().frame(|s| {
            s.taken_at = mock_time(12_000);
            s.allocated_total = 500;
        });
        let store = collected(source, 3);
        let diff = compute_diff(&store).unwrap();
        assert_eq!(diff.elapsed, Duration::from_secs(3));
        assert_eq!(diff.total_allocated, 300);
    }

    #[test]
    fn zero_elapsed_is_valid_without_rates() {
        let store = collected(MockSource::frozen_clock(), 2);
        let diff = compute_diff(&store).unwrap();
        assert_eq!(diff.elapsed, Duration::ZERO);
        assert_eq!(diff.total_allocated, 400);
        assert_eq!(diff.alloc_rate(), None);
        assert_eq!(diff.object_rate(), None);
    }

    #[test]
    fn rates_divide_by_elapsed_seconds() {
        let store = collected(MockSource::five_second_tick(), 2);
        let diff = compute_diff(&store).unwrap();
        assert!((diff.alloc_rate().unwrap() - 40_000.0).abs() < 1e-9);
        assert!((diff.object_rate().unwrap() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn mean_pause_divides_total_by_cycles() {
        let store = collected(MockSource::wrapping_pauses(), 2);
        let diff = compute_diff(&store).unwrap();
        assert_eq!(
            diff.mean_pause(),
            Some(Duration::from_nanos(17_000_000 / 3))
        );
    }

    #[test]
    fn diff_serializes_to_json() {
        let store = collected(MockSource::five_second_tick(), 2);
        let diff = compute_diff(&store).unwrap();
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["total_allocated"], 200_000);
        assert_eq!(json["gc_count_delta"], 1);
        assert_eq!(json["pauses_missing"], false);
    }
}
