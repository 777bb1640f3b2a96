//! Forced collection cycles.
//!
//! Rust has no tracing collector, so a "collection cycle" here is a purge of
//! every jemalloc arena: dirty pages go back to the operating system and the
//! wall time spent doing so is recorded as the cycle's pause.

use std::ptr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::collector::pause_log::PauseLog;
use crate::collector::runtime::RuntimeSource;

/// Runs collection cycles and keeps their pause log.
///
/// Clones share the same log, so one clone can drive cycles from the
/// sampling thread while another is handed to [`RuntimeSource`].
#[derive(Clone, Debug)]
pub struct Reclaimer {
    log: Arc<Mutex<PauseLog>>,
}

impl Reclaimer {
    /// Creates a reclaimer whose pause log holds `pause_capacity` entries.
    pub fn new(pause_capacity: usize) -> Self {
        Self {
            log: Arc::new(Mutex::new(PauseLog::new(pause_capacity))),
        }
    }

    /// Returns a statistics source reading this reclaimer's pause log.
    pub fn source(&self) -> RuntimeSource {
        RuntimeSource::new(Arc::clone(&self.log))
    }

    /// Runs one collection cycle now and returns its pause.
    pub fn run_cycle(&self) -> Duration {
        let started = Instant::now();
        purge_arenas();
        let pause = started.elapsed();
        self.record(pause);
        pause
    }

    /// Records a cycle that was run elsewhere.
    pub fn record(&self, pause: Duration) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(pause);
    }

    /// Number of cycles recorded so far.
    pub fn cycles(&self) -> u64 {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cycles()
    }
}

/// Returns unused pages of all jemalloc arenas to the operating system.
fn purge_arenas() {
    // SAFETY: mallctl with a valid NUL-terminated name and no old/new values.
    // MALLCTL_ARENAS_ALL = 4096 addresses every arena at once.
    let rc = unsafe {
        tikv_jemalloc_sys::mallctl(
            c"arena.4096.purge".as_ptr().cast(),
            ptr::null_mut(),
            ptr::null_mut(),
            ptr::null_mut(),
            0,
        )
    };
    if rc != 0 {
        debug!("arena purge returned {}", rc);
    }
}
