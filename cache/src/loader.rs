use crate::error::FetchError;

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// What a finished fetch produced.
pub(crate) type FetchOutcome<T, E> = Result<Arc<T>, FetchError<E>>;

/// The internal state of a value being fetched.
pub(crate) enum State<T, E> {
  Computing,
  Complete(FetchOutcome<T, E>),
}

/// The internal, mutex-protected core of the LoadFuture.
pub(crate) struct Inner<T, E> {
  pub(crate) state: State<T, E>,
  pub(crate) waiters: Vec<Waker>,
}

/// A future that represents a fetch in progress for one key.
/// It can be awaited by any number of tasks simultaneously; every waiter
/// receives a clone of the same outcome.
pub(crate) struct LoadFuture<T, E> {
  pub(crate) inner: Mutex<Inner<T, E>>,
}

impl<T, E> LoadFuture<T, E> {
  /// Creates a new `LoadFuture` in the "Computing" state.
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(Inner {
        state: State::Computing,
        waiters: Vec::new(),
      }),
    }
  }

  /// Completes the future, waking all waiters.
  ///
  /// Only the first completion counts; later calls are ignored.
  pub fn complete(&self, outcome: FetchOutcome<T, E>) {
    let waiters = {
      let mut inner = self.inner.lock();
      if matches!(inner.state, State::Complete(_)) {
        return;
      }
      inner.state = State::Complete(outcome);
      std::mem::take(&mut inner.waiters)
    };
    for waker in waiters {
      waker.wake();
    }
  }

  #[cfg(test)]
  pub fn is_complete(&self) -> bool {
    matches!(self.inner.lock().state, State::Complete(_))
  }
}

impl<T, E> Future for &LoadFuture<T, E> {
  type Output = FetchOutcome<T, E>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut inner = self.inner.lock();
    match &inner.state {
      State::Complete(outcome) => Poll::Ready(outcome.clone()),
      State::Computing => {
        if !inner.waiters.iter().any(|w| w.will_wake(cx.waker())) {
          inner.waiters.push(cx.waker().clone());
        }
        Poll::Pending
      }
    }
  }
}
