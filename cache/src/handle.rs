use crate::config::CacheOptions;
use crate::error::{BuildError, FetchError};
use crate::loader::{FetchOutcome, LoadFuture};
use crate::state::{FetchState, Observed};
use crate::store::{Begin, CacheStore};
use crate::time::Clock;
use crate::{FetchCacheBuilder, MetricsSnapshot};

use core::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tracing::{debug, trace};

pub(crate) type FetchFn<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// A memoized fetch for one resource key.
///
/// The handle owns the fetch function and the observed state a consumer
/// renders from (`data`, `is_loading`, `error`); cached entries live in its
/// `CacheStore`. Calling `fetch_data` serves a fresh cached value when there
/// is one and otherwise runs the fetch, sharing it with every other caller
/// that asks for the same key while it is running.
pub struct FetchCache<T, E> {
  key: String,
  fetch: FetchFn<T, E>,
  options: CacheOptions,
  clock: Arc<dyn Clock>,
  store: Arc<CacheStore<T, E>>,
  observed: Mutex<Observed<T, E>>,
}

impl<T, E> fmt::Debug for FetchCache<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let observed = self.observed.lock();
    f.debug_struct("FetchCache")
      .field("key", &self.key)
      .field("options", &self.options)
      .field("has_data", &observed.data.is_some())
      .field("is_loading", &(observed.pending > 0))
      .field("has_error", &observed.error.is_some())
      .finish_non_exhaustive()
  }
}

impl<T, E> FetchCache<T, E>
where
  T: Send + Sync + 'static,
  E: Send + Sync + 'static,
{
  /// Creates a handle with default options and a private store.
  pub fn new<F, Fut>(key: impl Into<String>, fetch: F) -> Result<Self, BuildError>
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    FetchCacheBuilder::new(key).build(fetch)
  }

  pub fn builder(key: impl Into<String>) -> FetchCacheBuilder<T, E> {
    FetchCacheBuilder::new(key)
  }
}

impl<T, E> FetchCache<T, E> {
  pub(crate) fn from_parts(
    key: String,
    fetch: FetchFn<T, E>,
    options: CacheOptions,
    clock: Arc<dyn Clock>,
    store: Arc<CacheStore<T, E>>,
  ) -> Self {
    Self {
      key,
      fetch,
      options,
      clock,
      store,
      observed: Mutex::new(Observed::new()),
    }
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn options(&self) -> CacheOptions {
    self.options
  }

  pub fn store(&self) -> &Arc<CacheStore<T, E>> {
    &self.store
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.store.metrics()
  }

  /// A snapshot of the observed `data`, `is_loading` and `error`.
  pub fn state(&self) -> FetchState<T, E> {
    self.observed.lock().snapshot()
  }

  pub fn data(&self) -> Option<Arc<T>> {
    self.observed.lock().data.clone()
  }

  pub fn is_loading(&self) -> bool {
    self.observed.lock().pending > 0
  }

  pub fn error(&self) -> Option<FetchError<E>> {
    self.observed.lock().error.clone()
  }

  /// The value currently cached for this key, fresh or stale, without
  /// fetching. Expired values are evicted and reported as absent.
  pub fn peek(&self) -> Option<Arc<T>> {
    self
      .store
      .peek(&self.key, self.clock.now(), self.options.cache_time)
  }

  /// Returns the value for this key, fetching it unless a fresh one is cached.
  ///
  /// With `force_refresh` the fetch always runs, even if the cached value is
  /// fresh or another fetch for the key is already in flight; the newest
  /// fetch is the one whose result is kept. Without it, a call made while a
  /// fetch is in flight waits for that fetch instead of starting another.
  ///
  /// On failure the error is returned and also published as the observed
  /// `error`, while the observed `data` keeps the last good value.
  pub async fn fetch_data(&self, force_refresh: bool) -> Result<Arc<T>, FetchError<E>> {
    let seq = self.observed.lock().next_seq();
    let begin = self.store.begin(
      &self.key,
      self.clock.now(),
      self.options.stale_time,
      self.options.cache_time,
      force_refresh,
    );

    match begin {
      Begin::Hit(value) => {
        let outcome = Ok(value);
        self.publish(seq, &outcome, None, true);
        outcome
      }
      Begin::Join { future, stale } => {
        let _loading = self.start_loading();
        let outcome = (&*future).await;
        self.publish(seq, &outcome, stale, false);
        outcome
      }
      Begin::Lead {
        ticket,
        future,
        stale,
      } => {
        let _loading = self.start_loading();
        let leader = Leader {
          store: &self.store,
          key: &self.key,
          ticket,
          future,
          finished: false,
        };
        let (outcome, stored) = self.run_fetch(leader).await;
        self.publish(seq, &outcome, stale, stored);
        outcome
      }
    }
  }

  /// Forces a fetch, as a pull-to-refresh gesture does.
  pub async fn refresh(&self) -> Result<Arc<T>, FetchError<E>> {
    self.fetch_data(true).await
  }

  /// Fetches only if needed, as when the screen showing this resource
  /// becomes visible.
  pub async fn on_focus(&self) -> Result<Arc<T>, FetchError<E>> {
    self.fetch_data(false).await
  }

  /// Removes this key's cached entry. The observed `data` is left as it is.
  pub fn invalidate_cache(&self) {
    self.store.invalidate(&self.key);
  }

  /// Removes every entry in this handle's store.
  pub fn clear_all_cache(&self) {
    self.store.clear();
  }

  /// Runs the fetch and reports it to the store. The flag tells whether the
  /// result was written back.
  async fn run_fetch(&self, mut leader: Leader<'_, T, E>) -> (FetchOutcome<T, E>, bool) {
    let result = (self.fetch)().await;
    let now = self.clock.now();

    let (outcome, stored) = match result {
      Ok(value) => {
        let value = Arc::new(value);
        let stored = self
          .store
          .finish_ok(&self.key, leader.ticket, value.clone(), now);
        (Ok(value), stored)
      }
      Err(err) => {
        self.store.finish_err(&self.key, leader.ticket);
        debug!(key = self.key.as_str(), ticket = leader.ticket, "fetch failed");
        (Err(FetchError::Failed(Arc::new(err))), false)
      }
    };

    leader.future.complete(outcome.clone());
    leader.finished = true;
    (outcome, stored)
  }

  fn start_loading(&self) -> LoadingGuard<'_, T, E> {
    let mut observed = self.observed.lock();
    observed.pending += 1;
    observed.error = None;
    LoadingGuard {
      observed: &self.observed,
    }
  }

  /// Publishes the outcome of call `seq` as the observed state. An outcome
  /// from a call older than the last published one is ignored unless its
  /// value was written to the store.
  fn publish(&self, seq: u64, outcome: &FetchOutcome<T, E>, stale: Option<Arc<T>>, stored: bool) {
    let mut observed = self.observed.lock();
    if seq < observed.published && !stored {
      trace!(
        key = self.key.as_str(),
        seq,
        published = observed.published,
        "not publishing outcome of an older call"
      );
      return;
    }
    observed.published = observed.published.max(seq);
    match outcome {
      Ok(value) => {
        observed.data = Some(value.clone());
        observed.error = None;
      }
      Err(err) => {
        if stale.is_some() {
          observed.data = stale;
        }
        observed.error = Some(err.clone());
      }
    }
  }
}

/// Decrements the handle's pending count when a waiting call ends, however
/// it ends.
struct LoadingGuard<'a, T, E> {
  observed: &'a Mutex<Observed<T, E>>,
}

impl<T, E> Drop for LoadingGuard<'_, T, E> {
  fn drop(&mut self) {
    let mut observed = self.observed.lock();
    observed.pending = observed.pending.saturating_sub(1);
  }
}

/// The call responsible for running a key's fetch. If it is dropped before
/// the fetch finishes, everyone waiting on the fetch is released with
/// `FetchError::Abandoned`.
struct Leader<'a, T, E> {
  store: &'a CacheStore<T, E>,
  key: &'a str,
  ticket: u64,
  future: Arc<LoadFuture<T, E>>,
  finished: bool,
}

impl<T, E> Drop for Leader<'_, T, E> {
  fn drop(&mut self) {
    if !self.finished {
      trace!(key = self.key, ticket = self.ticket, "fetch abandoned");
      self.store.abandon(self.key, self.ticket);
      self.future.complete(Err(FetchError::Abandoned));
    }
  }
}
