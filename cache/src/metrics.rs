use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// A thread-safe, internal metrics collector for a `CacheStore`.
/// All fields are atomic to allow for lock-free updates.
#[derive(Debug)]
pub struct Metrics {
  // --- Lookups ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,
  pub(crate) forced_refreshes: CachePadded<AtomicU64>,
  pub(crate) deduplicated: CachePadded<AtomicU64>,

  // --- Fetch outcomes ---
  pub(crate) stores: CachePadded<AtomicU64>,
  pub(crate) failures: CachePadded<AtomicU64>,
  pub(crate) abandoned: CachePadded<AtomicU64>,
  pub(crate) discarded: CachePadded<AtomicU64>,

  // --- Removals ---
  pub(crate) evicted_expired: CachePadded<AtomicU64>,
  pub(crate) invalidations: CachePadded<AtomicU64>,
  pub(crate) cleared: CachePadded<AtomicU64>,

  created_at: Instant,
}

// Manual implementation of Default to handle the non-default `Instant`.
impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      forced_refreshes: CachePadded::new(AtomicU64::new(0)),
      deduplicated: CachePadded::new(AtomicU64::new(0)),
      stores: CachePadded::new(AtomicU64::new(0)),
      failures: CachePadded::new(AtomicU64::new(0)),
      abandoned: CachePadded::new(AtomicU64::new(0)),
      discarded: CachePadded::new(AtomicU64::new(0)),
      evicted_expired: CachePadded::new(AtomicU64::new(0)),
      invalidations: CachePadded::new(AtomicU64::new(0)),
      cleared: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

#[inline]
pub(crate) fn bump(counter: &CachePadded<AtomicU64>) {
  counter.fetch_add(1, Ordering::Relaxed);
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Creates a point-in-time snapshot of the current metrics.
  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total_lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      forced_refreshes: self.forced_refreshes.load(Ordering::Relaxed),
      deduplicated: self.deduplicated.load(Ordering::Relaxed),
      stores: self.stores.load(Ordering::Relaxed),
      failures: self.failures.load(Ordering::Relaxed),
      abandoned: self.abandoned.load(Ordering::Relaxed),
      discarded: self.discarded.load(Ordering::Relaxed),
      evicted_expired: self.evicted_expired.load(Ordering::Relaxed),
      invalidations: self.invalidations.load(Ordering::Relaxed),
      cleared: self.cleared.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of a store's metrics.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// Calls answered from a fresh cached value, without fetching.
  pub hits: u64,
  /// Non-forced calls that had to start a fetch.
  pub misses: u64,
  /// The cache hit ratio (hits / (hits + misses)).
  pub hit_ratio: f64,
  /// Calls that started a fetch because a refresh was forced.
  pub forced_refreshes: u64,
  /// Calls that attached to a fetch already in flight instead of starting one.
  pub deduplicated: u64,
  /// Fetch results written back into the store.
  pub stores: u64,
  /// Fetches whose fetch function returned an error.
  pub failures: u64,
  /// Fetches dropped before they completed.
  pub abandoned: u64,
  /// Successful fetches whose result was not written back because the key
  /// was invalidated, cleared or superseded by a newer fetch meanwhile.
  pub discarded: u64,
  /// Values dropped because they outlived the cache time.
  pub evicted_expired: u64,
  /// Keys removed by `invalidate`.
  pub invalidations: u64,
  /// Keys removed by `clear`.
  pub cleared: u64,
  /// The number of seconds the store has existed.
  pub uptime_secs: u64,
}

impl MetricsSnapshot {
  /// Total number of times a fetch function was invoked.
  pub fn fetches(&self) -> u64 {
    self.misses + self.forced_refreshes
  }
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("forced_refreshes", &self.forced_refreshes)
      .field("deduplicated", &self.deduplicated)
      .field("stores", &self.stores)
      .field("failures", &self.failures)
      .field("abandoned", &self.abandoned)
      .field("discarded", &self.discarded)
      .field("evicted_expired", &self.evicted_expired)
      .field("invalidations", &self.invalidations)
      .field("cleared", &self.cleared)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
