//! Error types for the fetchpath library.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The main error type for the fetchpath library.
///
/// A category missing from the store is not represented here: absence falls
/// through to synthesized data and never surfaces as an error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// A single-use handle was observed after its value was already taken.
    #[error("invalid operation: handle already consumed")]
    HandleAlreadyConsumed,

    /// A single-use handle was taken synchronously before its value existed.
    #[error("invalid operation: handle is still pending")]
    HandleNotReady,

    /// The task backing an eager handle panicked or was cancelled.
    #[error("eager task failed: {0}")]
    TaskFailed(String),

    /// The process-wide result store was installed more than once.
    #[error("global result store has already been initialized")]
    AlreadyInitialized,

    /// An error that doesn't fit into other categories.
    #[error("fetchpath error: {0}")]
    Other(String),
}

impl Error {
    /// Creates a new task failure error.
    pub fn task<E: fmt::Display>(error: E) -> Self {
        Self::TaskFailed(error.to_string())
    }

    /// Creates a new other error.
    pub fn other<E: fmt::Display>(error: E) -> Self {
        Self::Other(error.to_string())
    }

    /// Short, stable name of the variant, used when reporting faults to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::HandleAlreadyConsumed => "HandleAlreadyConsumed",
            Error::HandleNotReady => "HandleNotReady",
            Error::TaskFailed(_) => "TaskFailed",
            Error::AlreadyInitialized => "AlreadyInitialized",
            Error::Other(_) => "Other",
        }
    }
}

/// A specialized `Result` type for retrieval operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio::task::JoinError> for Error {
    fn from(error: tokio::task::JoinError) -> Self {
        Error::task(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumed_message() {
        assert_eq!(
            Error::HandleAlreadyConsumed.to_string(),
            "invalid operation: handle already consumed"
        );
        assert_eq!(Error::HandleAlreadyConsumed.kind(), "HandleAlreadyConsumed");
    }

    #[test]
    fn test_error_serializes() {
        let json = serde_json::to_string(&Error::TaskFailed("boom".into())).unwrap();
        let back: Error = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Error::TaskFailed("boom".into()));
    }
}
