//! Allocation wrapper that counts allocator traffic.
//!
//! [`CountingAlloc`] wraps any [`GlobalAlloc`] and keeps process-wide
//! counters of allocation and deallocation calls and bytes. The counters
//! only move when the wrapper is installed as the `#[global_allocator]`;
//! otherwise every read returns zeros.

use std::alloc::{GlobalAlloc, Layout};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// Relaxed is sufficient: readers only need each counter to be atomic, a
// snapshot may observe frees a moment ahead of their allocations.
static ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);
static FREED_BYTES: AtomicU64 = AtomicU64::new(0);
static ALLOCS: AtomicU64 = AtomicU64::new(0);
static FREES: AtomicU64 = AtomicU64::new(0);

/// Process-wide allocator counters at a point in time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AllocCounters {
    /// Bytes handed out since process start.
    pub allocated_bytes: u64,
    /// Bytes returned since process start.
    pub freed_bytes: u64,
    /// Successful allocation calls since process start.
    pub allocs: u64,
    /// Deallocation calls since process start.
    pub frees: u64,
}

impl AllocCounters {
    /// Bytes currently allocated.
    pub fn live_bytes(&self) -> u64 {
        self.allocated_bytes.saturating_sub(self.freed_bytes)
    }

    /// Allocations not yet freed.
    pub fn live_objects(&self) -> u64 {
        self.allocs.saturating_sub(self.frees)
    }
}

/// Reads the current process-wide counters.
pub fn alloc_counters() -> AllocCounters {
    AllocCounters {
        allocated_bytes: ALLOCATED_BYTES.load(Ordering::Relaxed),
        freed_bytes: FREED_BYTES.load(Ordering::Relaxed),
        allocs: ALLOCS.load(Ordering::Relaxed),
        frees: FREES.load(Ordering::Relaxed),
    }
}

#[inline]
fn track_alloc(size: usize) {
    ALLOCATED_BYTES.fetch_add(size as u64, Ordering::Relaxed);
    ALLOCS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
fn track_free(size: usize) {
    FREED_BYTES.fetch_add(size as u64, Ordering::Relaxed);
    FREES.fetch_add(1, Ordering::Relaxed);
}

/// A global allocator that counts allocations before delegating.
///
/// # Examples
///
/// ```rust
/// use memstats::collector::CountingAlloc;
/// use tikv_jemallocator::Jemalloc;
///
/// #[global_allocator]
/// static GLOBAL: CountingAlloc<Jemalloc> = CountingAlloc::new(Jemalloc);
///
/// fn main() {}
/// ```
pub struct CountingAlloc<A: GlobalAlloc> {
    inner: A,
}

impl<A: GlobalAlloc> fmt::Debug for CountingAlloc<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingAlloc")
            .field("inner", &"<allocator>")
            .finish()
    }
}

impl<A: GlobalAlloc> CountingAlloc<A> {
    /// Wraps `inner` so that its traffic is counted.
    #[must_use]
    pub const fn new(inner: A) -> Self {
        Self { inner }
    }
}

// SAFETY: every call is forwarded to the wrapped allocator unchanged; the
// wrapper only updates atomic counters, which never allocates.
unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAlloc<A> {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded with the caller's layout.
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            track_alloc(layout.size());
        }
        ptr
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: forwarded with the caller's pointer and layout.
        unsafe { self.inner.dealloc(ptr, layout) };
        track_free(layout.size());
    }

    #[inline]
    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded with the caller's layout.
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            track_alloc(layout.size());
        }
        ptr
    }

    #[inline]
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: forwarded with the caller's arguments.
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        // A failed realloc leaves the old block in place.
        if !new_ptr.is_null() {
            track_free(layout.size());
            track_alloc(new_size);
        }
        new_ptr
    }
}
