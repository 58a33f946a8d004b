use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// The single, static reference point for all wall-clock readings in the crate.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Converts an `Instant` into a `Duration` since the crate's epoch.
#[inline]
pub(crate) fn instant_to_duration(instant: Instant) -> Duration {
  instant.saturating_duration_since(*CACHE_EPOCH)
}

/// A source of "now" for freshness and expiry decisions.
///
/// Readings are durations since an arbitrary fixed epoch. They only need to
/// be monotonic and comparable with each other; the cache never converts them
/// back to calendar time.
pub trait Clock: Send + Sync + 'static {
  fn now(&self) -> Duration;
}

/// The default clock, backed by `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  #[inline]
  fn now(&self) -> Duration {
    instant_to_duration(Instant::now())
  }
}

/// A clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one copy and hand the
/// other to a cache.
#[derive(Clone, Default)]
pub struct ManualClock {
  nanos: Arc<AtomicU64>,
}

impl ManualClock {
  /// Creates a clock reading zero.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a clock starting at the given reading.
  pub fn starting_at(start: Duration) -> Self {
    let clock = Self::new();
    clock.set(start);
    clock
  }

  /// Moves the clock forward by `by`.
  /// Saturates at the largest representable reading.
  pub fn advance(&self, by: Duration) {
    let by = saturating_nanos(by);
    let _ = self
      .nanos
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
        Some(now.saturating_add(by))
      });
  }

  /// Sets the clock to an absolute reading.
  pub fn set(&self, to: Duration) {
    self.nanos.store(saturating_nanos(to), Ordering::SeqCst);
  }
}

fn saturating_nanos(d: Duration) -> u64 {
  u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

impl Clock for ManualClock {
  fn now(&self) -> Duration {
    Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
  }
}

impl fmt::Debug for ManualClock {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ManualClock")
      .field("now", &self.now())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn manual_clock_clones_share_reading() {
    let clock = ManualClock::starting_at(Duration::from_millis(10));
    let other = clock.clone();

    clock.advance(Duration::from_millis(5));
    assert_eq!(other.now(), Duration::from_millis(15));

    other.set(Duration::from_secs(1));
    assert_eq!(clock.now(), Duration::from_secs(1));
  }

  #[test]
  fn manual_clock_saturates_instead_of_wrapping() {
    let max = Duration::from_nanos(u64::MAX);
    let clock = ManualClock::new();

    clock.set(Duration::MAX);
    assert_eq!(clock.now(), max);

    clock.set(Duration::from_secs(1));
    clock.advance(Duration::MAX);
    assert_eq!(clock.now(), max);
  }

  #[test]
  fn system_clock_is_monotonic() {
    let clock = SystemClock;
    let first = clock.now();
    let second = clock.now();
    assert!(second >= first);
  }
}
