//! A spawned, shareable completion handle.

use crate::error::Error;
use crate::Result;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A handle to a value produced by a task on the tokio runtime.
///
/// Construction always schedules a task and allocates shared completion
/// state, even when the value is already known. Clones share that state, so
/// the handle may be awaited any number of times.
pub struct EagerHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Shared<BoxFuture<'static, Result<T>>>,
}

impl<T> EagerHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawns `future` onto the current runtime and returns a handle to its output.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let task = tokio::spawn(future);
        let inner = async move { task.await.map_err(Error::from) }
            .boxed()
            .shared();
        Self { inner }
    }

    /// Wraps an already-known value, still going through a spawned task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn from_value(value: T) -> Self {
        Self::spawn(async move { value })
    }

    /// Returns the output if some clone has already driven the handle to completion.
    pub fn peek(&self) -> Option<&Result<T>> {
        self.inner.peek()
    }
}

impl<T> Clone for EagerHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Future for EagerHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl<T> fmt::Debug for EagerHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EagerHandle")
            .field("completed", &self.peek().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_awaited_many_times() {
        let handle = EagerHandle::from_value(vec![1, 2, 3]);
        let first = handle.clone().await.unwrap();
        let second = handle.clone().await.unwrap();
        let third = handle.await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[tokio::test]
    async fn test_peek_after_completion() {
        let handle = EagerHandle::spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            7u32
        });
        assert!(handle.peek().is_none());

        let observer = handle.clone();
        assert_eq!(observer.await.unwrap(), 7);
        assert_eq!(handle.peek(), Some(&Ok(7)));
    }

    #[tokio::test]
    async fn test_panicking_task_reports_failure() {
        async fn explode() -> u32 {
            panic!("task blew up")
        }

        let handle = EagerHandle::spawn(explode());
        match handle.await {
            Err(Error::TaskFailed(message)) => assert!(message.contains("panic")),
            other => panic!("expected task failure, got {:?}", other),
        }
    }
}
