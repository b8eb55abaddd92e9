//! The retrieval service and its two result-delivery strategies.
//!
//! [`RetrievalService::fetch_eager`] always goes through an [`EagerHandle`],
//! even on a store hit, and waits out a miss with a cooperative sleep that
//! yields to the runtime. [`RetrievalService::fetch_lean`] returns a
//! [`SingleUseHandle`] built directly in the ready state and waits out a miss
//! by blocking the calling thread. The contrast between those two paths is the
//! point of the crate: the lean path allocates less on hits but monopolises a
//! worker on misses.

use crate::allocation::MemoryBaseline;
use crate::handle::{EagerHandle, SingleUseHandle};
use crate::metrics::Metrics;
use crate::store::{items, Item, ResultStore};
use crate::utils::{format_megabytes, format_millis};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default artificial delay standing in for slow I/O on a store miss.
pub const SIMULATED_LATENCY: Duration = Duration::from_millis(500);

/// Items synthesized by the eager path on a miss.
pub fn eager_fallback() -> Vec<Item> {
    items(["Salad", "Soup"])
}

/// Items synthesized by the lean path on a miss.
pub fn lean_fallback() -> Vec<Item> {
    items(["Chicken", "Rice"])
}

/// The single item produced by [`RetrievalService::fetch_misusable`].
pub fn misusable_items() -> Vec<Item> {
    items(["This is a broken food"])
}

/// Configuration options for the retrieval service.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Delay applied on every store miss and by the misuse demonstration.
    pub simulated_latency: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            simulated_latency: SIMULATED_LATENCY,
        }
    }
}

impl RetrievalConfig {
    /// Sets the simulated latency.
    pub fn with_simulated_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency = latency;
        self
    }
}

/// Which delivery strategy served a retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Spawned, multiply-awaitable handle; cooperative wait on miss.
    Eager,
    /// Inline single-use handle; blocking wait on miss.
    Lean,
}

impl Strategy {
    /// Lowercase label used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Eager => "eager",
            Strategy::Lean => "lean",
        }
    }
}

/// Items returned by one retrieval together with what it cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalOutcome {
    /// The retrieved items, cached or synthesized.
    pub items: Vec<Item>,
    /// Wall time of the retrieval in milliseconds, two fractional digits.
    pub elapsed_ms: String,
    /// Bytes allocated during the retrieval, in megabytes, two fractional digits.
    pub simulated_memory_mb: String,
    /// Unformatted wall time.
    #[serde(skip)]
    pub elapsed: Duration,
}

struct Measurement {
    started: Instant,
    memory: MemoryBaseline,
}

impl Measurement {
    fn begin() -> Self {
        Self {
            started: Instant::now(),
            memory: MemoryBaseline::capture(),
        }
    }
}

/// Serves items from a [`ResultStore`] through either delivery strategy.
#[derive(Debug)]
pub struct RetrievalService {
    store: Arc<ResultStore>,
    config: RetrievalConfig,
    eager_metrics: Metrics,
    lean_metrics: Metrics,
}

impl Default for RetrievalService {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrievalService {
    /// Creates a service over the global store with default configuration.
    pub fn new() -> Self {
        Self::with_config(crate::global_store(), RetrievalConfig::default())
    }

    /// Creates a service over an explicit store and configuration.
    pub fn with_config(store: Arc<ResultStore>, config: RetrievalConfig) -> Self {
        Self {
            store,
            config,
            eager_metrics: Metrics::new(),
            lean_metrics: Metrics::new(),
        }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Returns the store this service reads from.
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Returns the counters for one strategy.
    pub fn metrics(&self, strategy: Strategy) -> &Metrics {
        match strategy {
            Strategy::Eager => &self.eager_metrics,
            Strategy::Lean => &self.lean_metrics,
        }
    }

    /// Retrieves `category` through a spawned, multiply-awaitable handle.
    ///
    /// A hit still schedules a task to deliver the already-known list. A miss
    /// sleeps cooperatively for the simulated latency and returns
    /// [`eager_fallback`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskFailed`](crate::Error::TaskFailed) if the delivery
    /// task panics or is cancelled.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub async fn fetch_eager(&self, category: &str) -> Result<RetrievalOutcome> {
        let measurement = Measurement::begin();

        let cached = self.store.lookup(category);
        let hit = cached.is_some();
        self.log_lookup(Strategy::Eager, category, hit);

        let items = match cached {
            Some(cached) => EagerHandle::from_value(cached.to_vec()).await?,
            None => {
                tokio::time::sleep(self.config.simulated_latency).await;
                eager_fallback()
            }
        };

        Ok(self.finish(Strategy::Eager, measurement, items, hit))
    }

    /// Retrieves `category` into a handle that is already complete.
    ///
    /// A hit copies the stored list straight into the handle without creating
    /// any task or boxed future. A miss blocks the calling thread for the
    /// simulated latency and returns [`lean_fallback`].
    pub fn fetch_lean(&self, category: &str) -> SingleUseHandle<RetrievalOutcome> {
        let measurement = Measurement::begin();

        let cached = self.store.lookup(category);
        let hit = cached.is_some();
        self.log_lookup(Strategy::Lean, category, hit);

        let items = match cached {
            Some(cached) => cached.to_vec(),
            None => {
                std::thread::sleep(self.config.simulated_latency);
                lean_fallback()
            }
        };

        SingleUseHandle::ready(self.finish(Strategy::Lean, measurement, items, hit))
    }

    /// Blocks for the simulated latency and returns a single-use handle over
    /// [`misusable_items`].
    ///
    /// Callers are expected to observe the handle once. Observing it twice
    /// fails with [`Error::HandleAlreadyConsumed`](crate::Error::HandleAlreadyConsumed).
    pub fn fetch_misusable(&self) -> SingleUseHandle<Vec<Item>> {
        std::thread::sleep(self.config.simulated_latency);
        SingleUseHandle::ready(misusable_items())
    }

    /// Counts a single-use handle of `strategy` observed after it was consumed.
    pub fn record_consumption_fault(&self, strategy: Strategy) {
        self.metrics(strategy).record_consumption_fault();

        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!(
            "fetchpath_consumption_faults_total",
            "strategy" => strategy.as_str()
        );
    }

    fn log_lookup(&self, strategy: Strategy, category: &str, hit: bool) {
        tracing::debug!(strategy = strategy.as_str(), category, hit, "store lookup");
    }

    // Hits and misses are counted only once the retrieval completes, so a
    // failed or cancelled fetch leaves every counter untouched.
    fn finish(
        &self,
        strategy: Strategy,
        measurement: Measurement,
        items: Vec<Item>,
        hit: bool,
    ) -> RetrievalOutcome {
        let elapsed = measurement.started.elapsed();
        let allocated = measurement.memory.delta_bytes();

        let counters = self.metrics(strategy);
        if hit {
            counters.record_hit();
        } else {
            counters.record_miss();
        }
        counters.record_cost(elapsed, allocated);

        #[cfg(feature = "metrics")]
        {
            let name = if hit {
                "fetchpath_store_hits_total"
            } else {
                "fetchpath_store_misses_total"
            };
            ::metrics::increment_counter!(name, "strategy" => strategy.as_str());
            ::metrics::histogram!(
                "fetchpath_fetch_duration_seconds",
                elapsed.as_secs_f64(),
                "strategy" => strategy.as_str()
            );
        }

        RetrievalOutcome {
            items,
            elapsed_ms: format_millis(elapsed),
            simulated_memory_mb: format_megabytes(allocated),
            elapsed,
        }
    }
}
