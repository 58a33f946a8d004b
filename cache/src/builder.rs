use crate::config::{CacheOptions, Preset};
use crate::error::BuildError;
use crate::handle::{FetchCache, FetchFn};
use crate::store::CacheStore;
use crate::time::{Clock, SystemClock};
use crate::EvictionListener;

#[cfg(feature = "config")]
use crate::config::QueryConfig;

use core::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tracing::warn;

/// A builder for `FetchCache` handles.
///
/// ```
/// use fibre_query::FetchCacheBuilder;
/// use std::time::Duration;
///
/// let trips = FetchCacheBuilder::<Vec<String>, std::io::Error>::new("admin-trips")
///   .stale_time(Duration::from_secs(120))
///   .cache_time(Duration::from_secs(300))
///   .build(|| async { Ok(vec!["Lisbon → Porto".to_string()]) })
///   .unwrap();
///
/// assert_eq!(trips.key(), "admin-trips");
/// ```
pub struct FetchCacheBuilder<T, E> {
  key: String,
  options: CacheOptions,
  clock: Option<Arc<dyn Clock>>,
  store: Option<Arc<CacheStore<T, E>>>,
  listener: Option<Arc<dyn EvictionListener<T>>>,
}

// Manual Debug implementation for FetchCacheBuilder.
impl<T, E> fmt::Debug for FetchCacheBuilder<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FetchCacheBuilder")
      .field("key", &self.key)
      .field("options", &self.options)
      .field("shared_store", &self.store.is_some())
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

impl<T, E> FetchCacheBuilder<T, E>
where
  T: Send + Sync + 'static,
  E: Send + Sync + 'static,
{
  /// Starts a builder for the resource named `key`, with the default
  /// 5 minute stale time and 10 minute cache time.
  pub fn new(key: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      options: CacheOptions::default(),
      clock: None,
      store: None,
      listener: None,
    }
  }

  /// Starts a builder with one of the built-in resource presets.
  pub fn from_preset(preset: Preset) -> Self {
    Self::new(preset.key()).options(preset.options())
  }

  /// Sets how long a fetched value is served without refetching.
  pub fn stale_time(mut self, duration: Duration) -> Self {
    self.options.stale_time = duration;
    self
  }

  /// Sets how long a fetched value stays in the store at all.
  pub fn cache_time(mut self, duration: Duration) -> Self {
    self.options.cache_time = duration;
    self
  }

  pub fn options(mut self, options: CacheOptions) -> Self {
    self.options = options;
    self
  }

  /// Takes the options configured for this builder's key.
  #[cfg(feature = "config")]
  pub fn config(mut self, config: &QueryConfig) -> Self {
    self.options = config.options_for(&self.key);
    self
  }

  /// Sets the clock used for freshness and expiry. Defaults to `SystemClock`.
  pub fn clock<C: Clock>(mut self, clock: C) -> Self {
    self.clock = Some(Arc::new(clock));
    self
  }

  /// Backs the handle with an existing store instead of a private one.
  ///
  /// Handles sharing a store see each other's entries, and
  /// `clear_all_cache` on any of them clears all of them.
  pub fn store(mut self, store: Arc<CacheStore<T, E>>) -> Self {
    self.store = Some(store);
    self
  }

  /// Sets the eviction listener of the handle's private store.
  ///
  /// A shared store passed to `store()` keeps its own listener; register
  /// one there with `CacheStore::with_listener` instead.
  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<T> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Builds the handle around `fetch`, the operation that produces a fresh
  /// value for the key.
  pub fn build<F, Fut>(self, fetch: F) -> Result<FetchCache<T, E>, BuildError>
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
  {
    if self.key.is_empty() {
      return Err(BuildError::EmptyKey);
    }

    if !self.options.is_consistent() {
      warn!(
        key = self.key.as_str(),
        stale_time = ?self.options.stale_time,
        cache_time = ?self.options.cache_time,
        "cache_time is shorter than stale_time; entries will expire before they go stale"
      );
    }

    let store = match (self.store, self.listener) {
      (Some(store), None) => store,
      (Some(store), Some(_)) => {
        warn!(
          key = self.key.as_str(),
          "eviction listener ignored because a shared store was supplied"
        );
        store
      }
      (None, Some(listener)) => Arc::new(CacheStore::new().with_listener_arc(listener)),
      (None, None) => Arc::new(CacheStore::new()),
    };

    let fetch: FetchFn<T, E> = Arc::new(move || fetch().boxed());
    let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

    Ok(FetchCache::from_parts(self.key, fetch, self.options, clock, store))
  }
}
