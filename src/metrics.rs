//! Metrics collection for retrieval operations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Tracks retrieval metrics like hits, misses, and time spent.
#[derive(Debug, Default)]
pub struct Metrics {
    hits: AtomicU64,
    misses: AtomicU64,
    consumption_faults: AtomicU64,
    fetches: AtomicU64,
    elapsed_ns: AtomicU64,
    allocated_bytes: AtomicU64,
}

impl Metrics {
    /// Creates a new `Metrics` instance with all counters set to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a cache hit.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cache miss.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a single-use handle observed after it was consumed.
    pub fn record_consumption_fault(&self) {
        self.consumption_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the cost of one completed retrieval.
    pub fn record_cost(&self, elapsed: Duration, allocated_bytes: u64) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_ns.fetch_add(nanos, Ordering::Relaxed);
        self.allocated_bytes
            .fetch_add(allocated_bytes, Ordering::Relaxed);
    }

    /// Returns the current hit count.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the current miss count.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Returns the current consumption fault count.
    pub fn consumption_faults(&self) -> u64 {
        self.consumption_faults.load(Ordering::Relaxed)
    }

    /// Returns the number of retrievals whose cost was recorded.
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Returns the total bytes allocated across all retrievals.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }

    /// Returns the hit rate as a float between 0.0 and 1.0.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let misses = self.misses();

        if hits + misses == 0 {
            0.0
        } else {
            hits as f64 / (hits + misses) as f64
        }
    }

    /// Returns the mean wall time of a retrieval.
    pub fn average_elapsed(&self) -> Duration {
        let fetches = self.fetches();
        if fetches == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.elapsed_ns.load(Ordering::Relaxed) / fetches)
        }
    }
}
