//! Pre-built scripted scenarios for testing.
//!
//! These scenarios provide realistic pairs of captures for the situations
//! the diff engine has to handle: steady allocation, pause-log wraparound
//! with and without loss, and a wall clock stepping backwards.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::source::MockSource;
use crate::storage::DEFAULT_PAUSE_CAPACITY;

/// Base of the scripted clock (2023-11-14T22:13:20Z).
const MOCK_EPOCH_SECS: i64 = 1_700_000_000;

/// Scripted wall-clock time `offset_ms` milliseconds after the mock epoch.
pub fn mock_time(offset_ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::default()
        + TimeDelta::seconds(MOCK_EPOCH_SECS)
        + TimeDelta::milliseconds(offset_ms)
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

impl MockSource {
    /// One five-second tick with a single collection cycle.
    ///
    /// 200 kB allocated over the tick, live bytes grow from 500 kB to
    /// 600 kB, and cycle 5 paused for 2 ms.
    pub fn five_second_tick() -> Self {
        Self::new(DEFAULT_PAUSE_CAPACITY)
            .frame(|s| {
                s.taken_at = mock_time(0);
                s.allocated_total = 1_000_000;
                s.allocated_live = 500_000;
                s.malloc_count = 10_000;
                s.free_count = 9_000;
                s.heap_alloc_live = 480_000;
                s.heap_from_system = 4_194_304;
                s.heap_object_count = 1_000;
                s.gc_count = 4;
                s.pause_log[4] = ms(1);
                s.pause_total = ms(6);
            })
            .frame(|s| {
                s.taken_at = mock_time(5_000);
                s.allocated_total = 1_200_000;
                s.allocated_live = 600_000;
                s.malloc_count = 12_000;
                s.free_count = 10_500;
                s.heap_alloc_live = 590_000;
                s.heap_from_system = 6_291_456;
                s.heap_object_count = 1_500;
                s.gc_count = 5;
                s.pause_log[5] = ms(2);
                s.pause_total = ms(8);
            })
    }

    /// Three cycles whose pauses straddle the end of an 8-slot ring.
    ///
    /// Cycles 11, 12 and 13 paused 9 ms, 3 ms and 5 ms (slots 3, 4, 5).
    pub fn wrapping_pauses() -> Self {
        Self::new(8)
            .frame(|s| {
                s.taken_at = mock_time(0);
                s.gc_count = 10;
                s.pause_total = ms(40);
            })
            .frame(|s| {
                s.taken_at = mock_time(1_000);
                s.gc_count = 13;
                s.pause_log[3] = ms(9);
                s.pause_log[4] = ms(3);
                s.pause_log[5] = ms(5);
                s.pause_total = ms(57);
            })
    }

    /// Ten cycles between captures with an 8-slot ring: two are lost.
    pub fn lost_pauses() -> Self {
        Self::new(8)
            .frame(|s| {
                s.taken_at = mock_time(0);
                s.gc_count = 10;
            })
            .frame(|s| {
                s.taken_at = mock_time(1_000);
                s.gc_count = 20;
                for (slot, pause) in s.pause_log.iter_mut().enumerate() {
                    *pause = ms(slot as u64 + 1);
                }
                s.pause_total = ms(55);
            })
    }

    /// The wall clock steps back one second between captures.
    pub fn clock_regression() -> Self {
        Self::new(8)
            .frame(|s| {
                s.taken_at = mock_time(10_000);
                s.allocated_total = 100;
            })
            .frame(|s| {
                s.taken_at = mock_time(9_000);
                s.allocated_total = 200;
            })
    }

    /// Two captures stamped with the same instant.
    pub fn frozen_clock() -> Self {
        Self::new(8)
            .frame(|s| {
                s.taken_at = mock_time(0);
                s.allocated_total = 100;
                s.heap_object_count = 10;
            })
            .frame(|s| {
                s.allocated_total = 500;
                s.heap_object_count = 20;
            })
    }
}
