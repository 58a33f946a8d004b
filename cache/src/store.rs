use crate::entry::{InFlight, Slot};
use crate::loader::LoadFuture;
use crate::metrics::{bump, Metrics, MetricsSnapshot};
use crate::{EvictionListener, EvictionReason};

use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use ahash::HashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

/// What `fetch_data` should do after consulting the store.
pub(crate) enum Begin<T, E> {
  /// A fresh value is cached; no fetch is needed.
  Hit(Arc<T>),
  /// A fetch is already in flight; wait for it.
  Join {
    future: Arc<LoadFuture<T, E>>,
    stale: Option<Arc<T>>,
  },
  /// The caller must run the fetch and report back with `ticket`.
  Lead {
    ticket: u64,
    future: Arc<LoadFuture<T, E>>,
    stale: Option<Arc<T>>,
  },
}

struct Slots<T, E> {
  map: HashMap<String, Slot<T, E>>,
  next_ticket: u64,
}

/// The key → entry map behind one or more `FetchCache` handles.
///
/// A store is an explicitly owned value: a handle built without one creates
/// its own, and handles that should share entries (and `clear_all_cache`)
/// are given the same `Arc<CacheStore>`. Expiry is checked lazily whenever a
/// key is read; nothing runs in the background.
pub struct CacheStore<T, E> {
  slots: Mutex<Slots<T, E>>,
  metrics: Metrics,
  listener: Option<Arc<dyn EvictionListener<T>>>,
}

impl<T, E> fmt::Debug for CacheStore<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheStore")
      .field("len", &self.len())
      .field("has_listener", &self.listener.is_some())
      .field("metrics", &self.metrics.snapshot())
      .finish()
  }
}

impl<T, E> Default for CacheStore<T, E> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T, E> CacheStore<T, E> {
  /// Creates an empty store.
  pub fn new() -> Self {
    Self {
      slots: Mutex::new(Slots {
        map: HashMap::default(),
        next_ticket: 0,
      }),
      metrics: Metrics::new(),
      listener: None,
    }
  }

  /// Registers a listener notified whenever a cached value is removed.
  pub fn with_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<T> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  pub(crate) fn with_listener_arc(mut self, listener: Arc<dyn EvictionListener<T>>) -> Self {
    self.listener = Some(listener);
    self
  }

  /// Number of keys with a slot, including keys whose first fetch is in flight.
  pub fn len(&self) -> usize {
    self.slots.lock().map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.slots.lock().map.contains_key(key)
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot()
  }

  /// Removes the entry for `key`, returning `true` if there was one.
  ///
  /// A fetch in flight for the key keeps running, but its result will not be
  /// written back.
  pub fn invalidate(&self, key: &str) -> bool {
    let removed = self.slots.lock().map.remove(key);
    match removed {
      Some(mut slot) => {
        bump(&self.metrics.invalidations);
        debug!(key, in_flight = slot.in_flight.is_some(), "invalidated cache entry");
        if let Some(value) = slot.take_value() {
          self.notify(key, value, EvictionReason::Invalidated);
        }
        true
      }
      None => false,
    }
  }

  /// Removes every entry, returning how many keys were removed.
  pub fn clear(&self) -> usize {
    let drained: Vec<(String, Slot<T, E>)> = {
      let mut slots = self.slots.lock();
      slots.map.drain().collect()
    };

    let count = drained.len();
    self
      .metrics
      .cleared
      .fetch_add(count as u64, std::sync::atomic::Ordering::Relaxed);
    debug!(count, "cleared cache store");

    for (key, mut slot) in drained {
      if let Some(value) = slot.take_value() {
        self.notify(&key, value, EvictionReason::Cleared);
      }
    }
    count
  }

  /// Returns the cached value for `key` if one exists and has not expired,
  /// regardless of freshness.
  pub(crate) fn peek(&self, key: &str, now: Duration, cache_time: Duration) -> Option<Arc<T>> {
    let (value, expired) = {
      let mut slots = self.slots.lock();
      let expired = Self::evict_if_expired(&mut slots.map, key, now, cache_time);
      let value = slots.map.get(key).and_then(|slot| slot.value.clone());
      (value, expired)
    };
    self.on_expired(key, expired);
    value
  }

  /// Consults the entry for `key` and decides how a `fetch_data` call proceeds.
  ///
  /// Reading, the freshness decision and installing a new in-flight fetch all
  /// happen under one lock acquisition.
  pub(crate) fn begin(
    &self,
    key: &str,
    now: Duration,
    stale_time: Duration,
    cache_time: Duration,
    force_refresh: bool,
  ) -> Begin<T, E> {
    let (begin, expired) = {
      let mut slots = self.slots.lock();
      let expired = Self::evict_if_expired(&mut slots.map, key, now, cache_time);
      let begin = self.decide(&mut slots, key, now, stale_time, force_refresh);
      (begin, expired)
    };
    self.on_expired(key, expired);
    begin
  }

  fn decide(
    &self,
    slots: &mut Slots<T, E>,
    key: &str,
    now: Duration,
    stale_time: Duration,
    force_refresh: bool,
  ) -> Begin<T, E> {
    if !force_refresh {
      if let Some(slot) = slots.map.get(key) {
        if let Some(in_flight) = &slot.in_flight {
          bump(&self.metrics.deduplicated);
          trace!(key, ticket = in_flight.ticket, "joining in-flight fetch");
          return Begin::Join {
            future: in_flight.future.clone(),
            stale: slot.value.clone(),
          };
        }
        if let (true, Some(value)) = (slot.is_fresh(now, stale_time), &slot.value) {
          bump(&self.metrics.hits);
          trace!(key, "serving fresh cached value");
          return Begin::Hit(value.clone());
        }
      }
      bump(&self.metrics.misses);
    } else {
      bump(&self.metrics.forced_refreshes);
    }

    slots.next_ticket += 1;
    let ticket = slots.next_ticket;
    let future = Arc::new(LoadFuture::new());

    let slot = slots.map.entry(key.to_owned()).or_insert_with(Slot::empty);
    let superseded = slot.supersede(InFlight {
      ticket,
      future: future.clone(),
    });
    debug!(key, ticket, force_refresh, superseded = ?superseded, "starting fetch");

    Begin::Lead {
      ticket,
      future,
      stale: slot.value.clone(),
    }
  }

  /// Writes a successful fetch back if `ticket` is still the key's current
  /// fetch. Returns whether the value was stored.
  pub(crate) fn finish_ok(&self, key: &str, ticket: u64, value: Arc<T>, now: Duration) -> bool {
    let mut slots = self.slots.lock();
    match slots.map.get_mut(key) {
      Some(slot) if slot.in_flight_ticket() == Some(ticket) => {
        slot.store(value, now);
        bump(&self.metrics.stores);
        trace!(key, ticket, "stored fetched value");
        true
      }
      other => {
        if let Some(slot) = other {
          slot.retire(ticket);
        }
        bump(&self.metrics.discarded);
        debug!(key, ticket, "discarding result of a fetch that is no longer current");
        false
      }
    }
  }

  /// Ends a failed fetch, keeping whatever value was cached before it.
  pub(crate) fn finish_err(&self, key: &str, ticket: u64) {
    bump(&self.metrics.failures);
    self.release(key, ticket);
  }

  /// Ends a fetch that was dropped before completing.
  pub(crate) fn abandon(&self, key: &str, ticket: u64) {
    bump(&self.metrics.abandoned);
    self.release(key, ticket);
  }

  fn release(&self, key: &str, ticket: u64) {
    let mut slots = self.slots.lock();
    let vacant = match slots.map.get_mut(key) {
      Some(slot) => {
        if slot.retire(ticket) {
          trace!(key, ticket, resumed = ?slot.in_flight_ticket(), "released fetch");
        }
        slot.is_vacant()
      }
      None => false,
    };
    if vacant {
      slots.map.remove(key);
    }
  }

  /// Drops an expired value. The slot itself survives while a fetch is in
  /// flight so later callers still join that fetch.
  fn evict_if_expired(
    map: &mut HashMap<String, Slot<T, E>>,
    key: &str,
    now: Duration,
    cache_time: Duration,
  ) -> Option<Arc<T>> {
    let slot = map.get_mut(key)?;
    if !slot.is_expired(now, cache_time) {
      return None;
    }
    let value = slot.take_value();
    if slot.is_vacant() {
      map.remove(key);
    }
    value
  }

  fn on_expired(&self, key: &str, expired: Option<Arc<T>>) {
    if let Some(value) = expired {
      bump(&self.metrics.evicted_expired);
      debug!(key, "evicted expired cache entry");
      self.notify(key, value, EvictionReason::Expired);
    }
  }

  fn notify(&self, key: &str, value: Arc<T>, reason: EvictionReason) {
    if let Some(listener) = &self.listener {
      listener.on_evict(key, value, reason);
    }
  }
}
