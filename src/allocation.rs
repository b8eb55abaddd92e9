//! Coarse allocation counting used for the memory figure of each retrieval.
//!
//! Install [`CountingAllocator`] as the global allocator to get real numbers:
//!
//! ```ignore
//! use fetchpath::allocation::CountingAllocator;
//!
//! #[global_allocator]
//! static ALLOC: CountingAllocator = CountingAllocator;
//! ```
//!
//! Without it the counter never moves and every delta reads zero.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);

/// A [`System`] allocator wrapper that counts every byte handed out.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            ALLOCATED_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            ALLOCATED_BYTES.fetch_add(layout.size() as u64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() && new_size > layout.size() {
            ALLOCATED_BYTES.fetch_add((new_size - layout.size()) as u64, Ordering::Relaxed);
        }
        new_ptr
    }
}

/// Total bytes allocated through [`CountingAllocator`] since process start.
///
/// The counter is monotonic and process-wide, so concurrent work shows up in
/// every open baseline.
pub fn allocated_bytes() -> u64 {
    ALLOCATED_BYTES.load(Ordering::Relaxed)
}

/// A snapshot of the allocation counter taken at the start of a measurement.
#[derive(Debug, Clone, Copy)]
pub struct MemoryBaseline {
    start: u64,
}

impl MemoryBaseline {
    /// Records the current counter value.
    pub fn capture() -> Self {
        Self {
            start: allocated_bytes(),
        }
    }

    /// Bytes allocated since the snapshot.
    pub fn delta_bytes(&self) -> u64 {
        allocated_bytes().saturating_sub(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_sees_counted_allocation() {
        let layout = Layout::from_size_align(1024, 8).unwrap();
        let baseline = MemoryBaseline::capture();
        unsafe {
            let ptr = CountingAllocator.alloc_zeroed(layout);
            assert!(!ptr.is_null());
            CountingAllocator.dealloc(ptr, layout);
        }
        assert!(baseline.delta_bytes() >= 1024);
    }

    #[test]
    fn test_allocator_counts_directly() {
        let layout = Layout::from_size_align(256, 8).unwrap();
        let before = allocated_bytes();
        unsafe {
            let ptr = CountingAllocator.alloc(layout);
            assert!(!ptr.is_null());
            CountingAllocator.dealloc(ptr, layout);
        }
        assert!(allocated_bytes() >= before + 256);
    }
}
