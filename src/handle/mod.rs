//! Handles through which retrieval results are handed to callers.
//!
//! Two shapes are provided:
//!
//! * [`EagerHandle`] always spawns a task and boxes its completion state. Any
//!   number of clones may await it and each receives the same output.
//! * [`SingleUseHandle`] may be born already complete, in which case it holds
//!   the value inline and schedules nothing. Its value can be observed once;
//!   a second observation fails with [`Error::HandleAlreadyConsumed`].
//!
//! [`Error::HandleAlreadyConsumed`]: crate::error::Error::HandleAlreadyConsumed

use serde::{Deserialize, Serialize};

pub mod eager;
pub mod single_use;

pub use eager::EagerHandle;
pub use single_use::{Observe, SingleUseHandle};

/// Observable lifecycle of a [`SingleUseHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleState {
    /// The value is still being produced.
    Pending,
    /// The value is available and has not been observed.
    Ready,
    /// The value has been handed out; further observations fail.
    Consumed,
}
