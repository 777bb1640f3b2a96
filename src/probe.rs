//! Cancellable periodic sampling task.
//!
//! A [`Probe`] owns its [`SnapshotStore`] outright. On every tick it
//! collects, computes a diff against the previous capture and hands the diff
//! to a sink. Running it on a dedicated thread with [`Probe::spawn`] keeps
//! the store single-owner; the only shared state is the stop flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::collector::StatsSource;
use crate::diff::Diff;
use crate::storage::{DEFAULT_PAUSE_CAPACITY, SnapshotStore};

/// Default tick period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Granularity at which a sleeping probe notices a stop request.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised while configuring or starting a probe.
#[derive(Debug)]
pub enum ProbeError {
    /// The tick interval is zero.
    ZeroInterval,
    /// The statistics source keeps no pause history.
    ZeroPauseCapacity,
    /// The configured pause capacity differs from the source's.
    PauseCapacityMismatch { configured: usize, source: usize },
    /// The worker thread could not be started.
    Spawn(std::io::Error),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::ZeroInterval => write!(f, "tick interval must be greater than zero"),
            ProbeError::ZeroPauseCapacity => {
                write!(f, "pause log capacity must be greater than zero")
            }
            ProbeError::PauseCapacityMismatch { configured, source } => write!(
                f,
                "pause log capacity {} does not match the source capacity {}",
                configured, source
            ),
            ProbeError::Spawn(e) => write!(f, "failed to start probe thread: {}", e),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        ProbeError::Spawn(e)
    }
}

/// Probe settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Time between two captures.
    pub interval: Duration,
    /// Capacity of the pause log the statistics source keeps.
    pub pause_capacity: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            pause_capacity: DEFAULT_PAUSE_CAPACITY,
        }
    }
}

impl ProbeConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_pause_capacity(mut self, pause_capacity: usize) -> Self {
        self.pause_capacity = pause_capacity;
        self
    }

    /// Checks that the settings describe a runnable probe.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.interval.is_zero() {
            return Err(ProbeError::ZeroInterval);
        }
        if self.pause_capacity == 0 {
            return Err(ProbeError::ZeroPauseCapacity);
        }
        Ok(())
    }
}

type TickHook = Box<dyn FnMut() + Send>;

/// Periodic collect / diff / emit loop around a [`SnapshotStore`].
pub struct Probe<S: StatsSource> {
    interval: Duration,
    store: SnapshotStore<S>,
    after_tick: Option<TickHook>,
}

impl<S: StatsSource> std::fmt::Debug for Probe<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probe")
            .field("interval", &self.interval)
            .field("pause_capacity", &self.store.pause_capacity())
            .field("after_tick", &self.after_tick.is_some())
            .finish()
    }
}

impl<S: StatsSource> Probe<S> {
    /// Creates a probe reading from `source`.
    ///
    /// `config.pause_capacity` must equal the capacity `source` reports.
    pub fn new(config: ProbeConfig, source: S) -> Result<Self, ProbeError> {
        config.validate()?;
        let capacity = source.pause_capacity();
        if capacity == 0 {
            return Err(ProbeError::ZeroPauseCapacity);
        }
        if capacity != config.pause_capacity {
            return Err(ProbeError::PauseCapacityMismatch {
                configured: config.pause_capacity,
                source: capacity,
            });
        }
        Ok(Self {
            interval: config.interval,
            store: SnapshotStore::new(source),
            after_tick: None,
        })
    }

    /// Runs `hook` after every tick, e.g. to force a collection cycle.
    pub fn after_tick(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.after_tick = Some(Box::new(hook));
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn store(&self) -> &SnapshotStore<S> {
        &self.store
    }

    /// Collects one sample and returns the diff against the previous one.
    pub fn tick(&mut self) -> Option<Diff> {
        self.store.collect();
        self.store.diff()
    }

    /// Runs the loop on the current thread until `running` turns false.
    ///
    /// Takes a baseline sample first, so the first diff is delivered one
    /// interval later. Returns the number of diffs handed to `sink`.
    pub fn run(&mut self, running: &AtomicBool, mut sink: impl FnMut(&Diff)) -> u64 {
        let mut emitted: u64 = 0;
        self.store.collect();
        debug!("Baseline sample collected");

        while running.load(Ordering::SeqCst) {
            sleep_while_running(self.interval, running);
            if !running.load(Ordering::SeqCst) {
                break;
            }

            match self.tick() {
                Some(diff) => {
                    emitted += 1;
                    sink(&diff);
                }
                None => debug!("Tick produced no diff, retrying next tick"),
            }

            if let Some(hook) = self.after_tick.as_mut() {
                hook();
            }
        }

        emitted
    }
}

impl<S: StatsSource + 'static> Probe<S> {
    /// Moves the probe onto a dedicated thread.
    pub fn spawn(
        mut self,
        sink: impl FnMut(&Diff) + Send + 'static,
    ) -> Result<ProbeHandle, ProbeError> {
        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        let interval = self.interval;

        let thread = thread::Builder::new()
            .name("memstats-probe".to_string())
            .spawn(move || self.run(&r, sink))?;

        info!("Probe started (interval={:?})", interval);
        Ok(ProbeHandle {
            running,
            thread: Some(thread),
        })
    }
}

/// Handle to a probe running on its own thread.
///
/// Dropping the handle stops the probe and waits for it.
#[derive(Debug)]
pub struct ProbeHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<u64>>,
}

impl ProbeHandle {
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the probe and returns the number of diffs it emitted.
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        self.running.store(false, Ordering::SeqCst);
        let Some(thread) = self.thread.take() else {
            return 0;
        };
        match thread.join() {
            Ok(emitted) => {
                info!("Probe stopped after {} reports", emitted);
                emitted
            }
            Err(_) => {
                warn!("Probe thread panicked");
                0
            }
        }
    }
}

impl Drop for ProbeHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Sleeps for `interval` in short slices, returning early once `running`
/// turns false.
fn sleep_while_running(interval: Duration, running: &AtomicBool) {
    let mut remaining = interval;
    while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
        let sleep_time = remaining.min(STOP_POLL_INTERVAL);
        thread::sleep(sleep_time);
        remaining = remaining.saturating_sub(sleep_time);
    }
}
