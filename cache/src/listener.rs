use std::fmt;
use std::sync::Arc;

/// Describes the reason a cached value was removed from a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
  /// The value outlived its `cache_time` and was dropped on the next access.
  Expired,
  /// The key was manually invalidated.
  Invalidated,
  /// The whole store was cleared.
  Cleared,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Expired => write!(f, "evicted due to expiration (cache time)"),
      EvictionReason::Invalidated => write!(f, "manually invalidated"),
      EvictionReason::Cleared => write!(f, "removed by clearing the store"),
    }
  }
}

/// A listener that can be registered with a `CacheStore` to receive
/// notifications when cached values are removed.
///
/// `on_evict` runs on the task that caused the removal, after the store's
/// lock has been released. Keys without a stored value (a first fetch still
/// in flight, for example) produce no notification.
pub trait EvictionListener<T>: Send + Sync {
  fn on_evict(&self, key: &str, value: Arc<T>, reason: EvictionReason);
}

impl<T, F> EvictionListener<T> for F
where
  F: Fn(&str, Arc<T>, EvictionReason) + Send + Sync,
{
  fn on_evict(&self, key: &str, value: Arc<T>, reason: EvictionReason) {
    self(key, value, reason)
  }
}
