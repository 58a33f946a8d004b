use crate::error::FetchError;

use std::fmt;
use std::sync::Arc;

/// The externally observed state of a `FetchCache` handle: what a screen
/// renders from.
///
/// `data` and `error` can both be set at once: after a failed refresh the
/// previous data stays visible next to the error.
pub struct FetchState<T, E> {
  pub data: Option<Arc<T>>,
  pub is_loading: bool,
  pub error: Option<FetchError<E>>,
}

impl<T, E> FetchState<T, E> {
  pub(crate) fn initial() -> Self {
    Self {
      data: None,
      is_loading: false,
      error: None,
    }
  }

  /// True when data is shown alongside the error of a failed refresh.
  pub fn is_stale_with_error(&self) -> bool {
    self.data.is_some() && self.error.is_some()
  }
}

impl<T, E> Clone for FetchState<T, E> {
  fn clone(&self) -> Self {
    Self {
      data: self.data.clone(),
      is_loading: self.is_loading,
      error: self.error.clone(),
    }
  }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for FetchState<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FetchState")
      .field("data", &self.data)
      .field("is_loading", &self.is_loading)
      .field("error", &self.error)
      .finish()
  }
}

/// Mutable observed state kept inside a handle.
pub(crate) struct Observed<T, E> {
  pub(crate) data: Option<Arc<T>>,
  pub(crate) error: Option<FetchError<E>>,
  /// `fetch_data` calls on this handle that are currently waiting on a fetch.
  pub(crate) pending: usize,
  /// Sequence number handed to the most recent `fetch_data` call.
  pub(crate) issued: u64,
  /// Sequence number of the call whose outcome was last published.
  pub(crate) published: u64,
}

impl<T, E> Observed<T, E> {
  pub(crate) fn new() -> Self {
    Self {
      data: None,
      error: None,
      pending: 0,
      issued: 0,
      published: 0,
    }
  }

  pub(crate) fn next_seq(&mut self) -> u64 {
    self.issued += 1;
    self.issued
  }

  pub(crate) fn snapshot(&self) -> FetchState<T, E> {
    let mut state = FetchState::initial();
    state.data = self.data.clone();
    state.is_loading = self.pending > 0;
    state.error = self.error.clone();
    state
  }
}
