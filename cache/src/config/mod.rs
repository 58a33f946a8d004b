//! Cache timing options, the built-in resource presets and (with the
//! `config` feature) YAML configuration files.

mod presets;

#[cfg(feature = "config")]
mod processed;
#[cfg(feature = "config")]
mod raw;

pub use presets::Preset;

#[cfg(feature = "config")]
pub use processed::QueryConfig;

use std::time::Duration;

/// How long a value counts as fresh unless configured otherwise.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// How long a value stays in the store at all unless configured otherwise.
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(10 * 60);

/// Freshness and expiry windows for one cached resource.
///
/// A value younger than `stale_time` is served without fetching. A value
/// older than `cache_time` is dropped on the next access, as if it had
/// never been fetched. In between, the value is stale: a fetch is started
/// and the value stays available as a fallback if that fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
  pub stale_time: Duration,
  pub cache_time: Duration,
}

impl Default for CacheOptions {
  fn default() -> Self {
    Self::new(DEFAULT_STALE_TIME, DEFAULT_CACHE_TIME)
  }
}

impl CacheOptions {
  pub const fn new(stale_time: Duration, cache_time: Duration) -> Self {
    Self {
      stale_time,
      cache_time,
    }
  }

  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  pub fn with_cache_time(mut self, cache_time: Duration) -> Self {
    self.cache_time = cache_time;
    self
  }

  /// `false` when values would be evicted before they ever turn stale.
  ///
  /// Such options are accepted, but the stale window is then unreachable.
  pub fn is_consistent(&self) -> bool {
    self.cache_time >= self.stale_time
  }
}
