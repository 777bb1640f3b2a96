//! Allocator and collection counter sources.
//!
//! This module provides the sources a [`SnapshotStore`](crate::SnapshotStore)
//! reads from, with a scripted implementation for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      RuntimeSource                       │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────┐  │
//! │  │ CountingAlloc  │  │ jemalloc stats │  │  PauseLog  │  │
//! │  │ - bytes, calls │  │ - allocated    │  │ - cycles   │  │
//! │  │                │  │ - mapped       │  │ - pauses   │  │
//! │  └────────────────┘  └────────────────┘  └─────▲──────┘  │
//! └────────────────────────────────────────────────┼─────────┘
//!                                                  │
//!                                           ┌──────┴──────┐
//!                                           │  Reclaimer  │
//!                                           │(arena purge)│
//!                                           └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production
//!
//! ```ignore
//! use memstats::SnapshotStore;
//! use memstats::collector::{CountingAlloc, Reclaimer};
//! use tikv_jemallocator::Jemalloc;
//!
//! #[global_allocator]
//! static GLOBAL: CountingAlloc<Jemalloc> = CountingAlloc::new(Jemalloc);
//!
//! let reclaimer = Reclaimer::new(256);
//! let mut store = SnapshotStore::new(reclaimer.source());
//! store.collect();
//! ```
//!
//! ## Testing (with MockSource)
//!
//! ```
//! use memstats::{SnapshotStore, compute_diff};
//! use memstats::collector::MockSource;
//!
//! let mut store = SnapshotStore::new(MockSource::five_second_tick());
//! store.collect();
//! store.collect();
//! let diff = compute_diff(&store).unwrap();
//! assert_eq!(diff.total_allocated, 200_000);
//! ```

mod alloc;
pub mod mock;
mod pause_log;
mod reclaim;
mod runtime;
pub mod traits;

pub use alloc::{AllocCounters, CountingAlloc, alloc_counters};
pub use mock::{MockSource, mock_time};
pub use pause_log::PauseLog;
pub use reclaim::Reclaimer;
pub use runtime::{HeapStats, RuntimeSource};
pub use traits::StatsSource;
