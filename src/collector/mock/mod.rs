//! Scripted statistics sources for testing.
//!
//! This module provides `MockSource` and pre-built scenarios for testing
//! the snapshot store and diff engine without depending on the live
//! allocator.

mod scenarios;
mod source;

pub use scenarios::mock_time;
pub use source::MockSource;
