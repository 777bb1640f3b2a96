//! Snapshot model and the two-slot snapshot store.

pub mod snapshot;
mod store;

pub use snapshot::{DEFAULT_PAUSE_CAPACITY, Snapshot};
pub use store::SnapshotStore;
