//! A result wrapper that may be observed exactly once.

use super::HandleState;
use crate::error::Error;
use crate::Result;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

enum Slot<T> {
    Pending {
        future: BoxFuture<'static, T>,
        waiters: Vec<Waker>,
    },
    Ready(T),
    Consumed,
}

impl<T> Slot<T> {
    fn state(&self) -> HandleState {
        match self {
            Slot::Pending { .. } => HandleState::Pending,
            Slot::Ready(_) => HandleState::Ready,
            Slot::Consumed => HandleState::Consumed,
        }
    }
}

/// A value that becomes available at most once and may be observed once.
///
/// The handle moves through `Pending -> Ready -> Consumed`. Observing it
/// hands the value out and leaves the handle `Consumed`; every observation
/// after that fails with [`Error::HandleAlreadyConsumed`] instead of
/// returning the value again.
///
/// A handle built with [`SingleUseHandle::ready`] holds its value inline and
/// never touches the scheduler.
pub struct SingleUseHandle<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> SingleUseHandle<T> {
    /// Creates a handle whose value is already available.
    pub fn ready(value: T) -> Self {
        Self {
            slot: Mutex::new(Slot::Ready(value)),
        }
    }

    /// Creates a handle whose value is produced by `future` on first observation.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            slot: Mutex::new(Slot::Pending {
                future: future.boxed(),
                waiters: Vec::new(),
            }),
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> HandleState {
        self.lock().state()
    }

    /// Returns a future that resolves to the value, consuming it.
    ///
    /// If several observers race on a pending handle, exactly one receives the
    /// value and the rest resolve to [`Error::HandleAlreadyConsumed`].
    pub fn observe(&self) -> Observe<'_, T> {
        Observe { handle: self }
    }

    /// Takes the value without waiting.
    ///
    /// Fails with [`Error::HandleNotReady`] while pending (the handle is left
    /// untouched) and with [`Error::HandleAlreadyConsumed`] once consumed.
    pub fn try_take(&self) -> Result<T> {
        let mut slot = self.lock();
        match mem::replace(&mut *slot, Slot::Consumed) {
            Slot::Ready(value) => Ok(value),
            Slot::Consumed => Err(consumed_fault()),
            pending @ Slot::Pending { .. } => {
                *slot = pending;
                Err(Error::HandleNotReady)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for SingleUseHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleUseHandle")
            .field("state", &self.state())
            .finish()
    }
}

fn consumed_fault() -> Error {
    tracing::warn!("single-use handle observed after it was consumed");
    Error::HandleAlreadyConsumed
}

/// Future returned by [`SingleUseHandle::observe`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Observe<'a, T> {
    handle: &'a SingleUseHandle<T>,
}

impl<T> Future for Observe<'_, T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.handle.lock();
        match mem::replace(&mut *slot, Slot::Consumed) {
            Slot::Ready(value) => Poll::Ready(Ok(value)),
            Slot::Consumed => Poll::Ready(Err(consumed_fault())),
            Slot::Pending {
                mut future,
                mut waiters,
            } => match future.as_mut().poll(cx) {
                Poll::Ready(value) => {
                    // Losing observers must wake up to see `Consumed`.
                    waiters.drain(..).for_each(Waker::wake);
                    Poll::Ready(Ok(value))
                }
                Poll::Pending => {
                    if !waiters.iter().any(|w| w.will_wake(cx.waker())) {
                        waiters.push(cx.waker().clone());
                    }
                    *slot = Slot::Pending { future, waiters };
                    Poll::Pending
                }
            },
        }
    }
}

impl<T> fmt::Debug for Observe<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observe").field("handle", self.handle).finish()
    }
}
