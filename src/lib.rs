#![warn(missing_docs)]
//! # fetchpath
//!
//! Two ways of handing an asynchronously-produced value to a caller, side by
//! side over the same read-only result store:
//!
//! * **eager**: every retrieval, hit or miss, goes through a spawned task
//!   wrapped in a multiply-awaitable [`EagerHandle`]. Misses wait
//!   cooperatively, so other requests keep running.
//! * **lean**: hits are returned inside a [`SingleUseHandle`] that is already
//!   complete and schedules nothing. Misses block the calling thread. The
//!   handle may be observed exactly once.
//!
//! ```no_run
//! use fetchpath::RetrievalService;
//!
//! # async fn run() -> fetchpath::Result<()> {
//! let service = RetrievalService::new();
//!
//! let eager = service.fetch_eager("ready").await?;
//! println!("eager: {:?} in {} ms", eager.items, eager.elapsed_ms);
//!
//! let lean = service.fetch_lean("ready").observe().await?;
//! println!("lean: {:?} in {} ms", lean.items, lean.elapsed_ms);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod allocation;
pub mod api;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod service;
pub mod store;
mod utils;


pub use error::Error;
pub use handle::{EagerHandle, HandleState, SingleUseHandle};
pub use service::{RetrievalConfig, RetrievalOutcome, RetrievalService, Strategy};
pub use store::{Item, ResultStore};

/// The main result type.
pub type Result<T> = std::result::Result<T, error::Error>;

// Production builds freeze the store exactly once.
#[cfg(not(any(test, feature = "test-utils")))]
static GLOBAL_STORE: std::sync::OnceLock<Arc<ResultStore>> = std::sync::OnceLock::new();

// Tests may swap the store between cases, so it sits behind a reader-writer lock.
#[cfg(any(test, feature = "test-utils"))]
static GLOBAL_STORE: std::sync::RwLock<Option<Arc<ResultStore>>> = std::sync::RwLock::new(None);

/// Install the process-wide result store.
///
/// Must run before the first call to [`global_store`], which otherwise freezes
/// the seeded table in place.
///
/// # Examples
///
/// ```no_run
/// use fetchpath::{init_global_store, ResultStore};
///
/// init_global_store(ResultStore::seeded()).unwrap();
/// ```
#[cfg(not(any(test, feature = "test-utils")))]
pub fn init_global_store(store: ResultStore) -> Result<()> {
    GLOBAL_STORE
        .set(Arc::new(store))
        .map_err(|_| error::Error::AlreadyInitialized)
}

/// Install the process-wide result store (test version).
#[cfg(any(test, feature = "test-utils"))]
pub fn init_global_store(store: ResultStore) -> Result<()> {
    let mut slot = GLOBAL_STORE
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if slot.is_some() {
        return Err(error::Error::AlreadyInitialized);
    }
    *slot = Some(Arc::new(store));
    Ok(())
}

/// Get the process-wide result store, seeding it on first use.
#[cfg(not(any(test, feature = "test-utils")))]
pub fn global_store() -> Arc<ResultStore> {
    GLOBAL_STORE
        .get_or_init(|| Arc::new(ResultStore::seeded()))
        .clone()
}

/// Get the process-wide result store, seeding it on first use (test version).
#[cfg(any(test, feature = "test-utils"))]
pub fn global_store() -> Arc<ResultStore> {
    if let Some(store) = GLOBAL_STORE
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .as_ref()
    {
        return store.clone();
    }

    GLOBAL_STORE
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get_or_insert_with(|| Arc::new(ResultStore::seeded()))
        .clone()
}

/// Reset the global store for testing purposes.
///
/// This should only be used in tests and never in production code.
#[cfg(any(test, feature = "test-utils"))]
pub fn reset_global_store_for_testing() {
    *GLOBAL_STORE
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
}

/// Common prelude for using the library.
pub mod prelude {
    pub use crate::{
        error::Error,
        global_store,
        handle::{EagerHandle, HandleState, SingleUseHandle},
        init_global_store,
        service::{RetrievalConfig, RetrievalOutcome, RetrievalService, Strategy},
        store::{Item, ResultStore},
        Result,
    };
}
