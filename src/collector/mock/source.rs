//! Scripted `StatsSource` implementation.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::collector::traits::StatsSource;
use crate::storage::Snapshot;

/// A statistics source that replays scripted frames.
///
/// Each [`read_into`](StatsSource::read_into) consumes one frame; once the
/// script is exhausted the last frame is repeated. [`now`](StatsSource::now)
/// returns the `taken_at` of the frame the next read will consume, so a
/// store stamps every capture with the scripted time.
///
/// # Example
///
/// ```
/// use memstats::collector::{MockSource, mock_time};
///
/// let source = MockSource::new(8)
///     .frame(|s| {
///         s.taken_at = mock_time(0);
///         s.allocated_total = 400;
///     })
///     .frame(|s| {
///         s.taken_at = mock_time(1_000);
///         s.allocated_total = 1_000;
///     });
/// assert_eq!(source.remaining(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockSource {
    pause_capacity: usize,
    frames: VecDeque<Snapshot>,
    last: Snapshot,
}

impl MockSource {
    /// Creates an empty script whose pause log holds `pause_capacity` entries.
    pub fn new(pause_capacity: usize) -> Self {
        Self {
            pause_capacity,
            frames: VecDeque::new(),
            last: Snapshot::with_capacity(pause_capacity),
        }
    }

    /// Appends a frame derived from the previous one.
    ///
    /// The closure receives a copy of the most recently scripted frame (or a
    /// zeroed snapshot for the first frame), so counters only need to be set
    /// where they change.
    pub fn frame(mut self, edit: impl FnOnce(&mut Snapshot)) -> Self {
        let mut next = self
            .frames
            .back()
            .cloned()
            .unwrap_or_else(|| self.last.clone());
        edit(&mut next);
        self.push_frame(next);
        self
    }

    /// Appends a fully specified frame.
    ///
    /// The frame's pause log is resized to the source capacity.
    pub fn push_frame(&mut self, mut frame: Snapshot) {
        frame.pause_log.resize(self.pause_capacity, Default::default());
        self.frames.push_back(frame);
    }

    /// Number of scripted frames not yet consumed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl StatsSource for MockSource {
    fn pause_capacity(&self) -> usize {
        self.pause_capacity
    }

    fn now(&self) -> DateTime<Utc> {
        self.frames.front().unwrap_or(&self.last).taken_at
    }

    fn read_into(&mut self, snapshot: &mut Snapshot) {
        if let Some(frame) = self.frames.pop_front() {
            self.last = frame;
        }
        let taken_at = snapshot.taken_at;
        snapshot.clone_from(&self.last);
        snapshot.taken_at = taken_at;
    }
}
