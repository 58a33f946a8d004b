use crate::loader::LoadFuture;

use std::sync::Arc;
use std::time::Duration;

/// The fetch currently outstanding for a key.
pub(crate) struct InFlight<T, E> {
  /// Generation ticket of the fetch. Only the fetch holding the slot's
  /// current ticket may write its result back.
  pub(crate) ticket: u64,
  pub(crate) future: Arc<LoadFuture<T, E>>,
}

/// The per-key record kept by a `CacheStore`.
///
/// `value` and `fetched_at` are always set together.
pub(crate) struct Slot<T, E> {
  /// Last successfully fetched payload.
  pub(crate) value: Option<Arc<T>>,
  /// Clock reading at which `value` was stored.
  pub(crate) fetched_at: Option<Duration>,
  pub(crate) in_flight: Option<InFlight<T, E>>,
  /// Older fetches replaced by a forced refresh that are still running,
  /// oldest first. If the current fetch fails, the newest of these takes
  /// its place.
  pub(crate) superseded: Vec<InFlight<T, E>>,
}

impl<T, E> Slot<T, E> {
  pub(crate) fn empty() -> Self {
    Self {
      value: None,
      fetched_at: None,
      in_flight: None,
      superseded: Vec::new(),
    }
  }

  /// True once the stored value is older than `cache_time`.
  #[inline]
  pub(crate) fn is_expired(&self, now: Duration, cache_time: Duration) -> bool {
    self
      .fetched_at
      .map_or(false, |at| now.saturating_sub(at) > cache_time)
  }

  /// True while the stored value is younger than `stale_time`.
  #[inline]
  pub(crate) fn is_fresh(&self, now: Duration, stale_time: Duration) -> bool {
    self
      .fetched_at
      .map_or(false, |at| now.saturating_sub(at) < stale_time)
  }

  #[inline]
  pub(crate) fn in_flight_ticket(&self) -> Option<u64> {
    self.in_flight.as_ref().map(|in_flight| in_flight.ticket)
  }

  /// Installs a new in-flight fetch, keeping any fetch it replaces.
  /// Returns the ticket of the replaced fetch.
  pub(crate) fn supersede(&mut self, next: InFlight<T, E>) -> Option<u64> {
    let previous = self.in_flight.replace(next)?;
    let ticket = previous.ticket;
    self.superseded.push(previous);
    Some(ticket)
  }

  /// Ends the fetch holding `ticket` without storing anything. If it was the
  /// current fetch, the most recently replaced fetch becomes current again.
  /// Returns whether `ticket` was known to this slot.
  pub(crate) fn retire(&mut self, ticket: u64) -> bool {
    if self.in_flight_ticket() == Some(ticket) {
      self.in_flight = self.superseded.pop();
      return true;
    }
    let before = self.superseded.len();
    self.superseded.retain(|in_flight| in_flight.ticket != ticket);
    self.superseded.len() != before
  }

  /// Drops the stored value, returning it.
  pub(crate) fn take_value(&mut self) -> Option<Arc<T>> {
    self.fetched_at = None;
    self.value.take()
  }

  /// Stores a freshly fetched value and ends the in-flight fetch. Replaced
  /// fetches still running are older than this value and are forgotten.
  pub(crate) fn store(&mut self, value: Arc<T>, now: Duration) {
    self.value = Some(value);
    self.fetched_at = Some(now);
    self.in_flight = None;
    self.superseded.clear();
  }

  /// A slot with neither a value nor a fetch in flight carries no information.
  #[inline]
  pub(crate) fn is_vacant(&self) -> bool {
    self.value.is_none() && self.in_flight.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SEC: Duration = Duration::from_secs(1);

  fn stored_at(at: Duration) -> Slot<&'static str, ()> {
    let mut slot = Slot::empty();
    slot.store(Arc::new("v"), at);
    slot
  }

  #[test]
  fn freshness_window_is_exclusive() {
    let slot = stored_at(SEC);
    assert!(slot.is_fresh(SEC, SEC));
    assert!(slot.is_fresh(SEC * 2 - Duration::from_nanos(1), SEC));
    assert!(!slot.is_fresh(SEC * 2, SEC));
  }

  #[test]
  fn expiry_requires_strictly_older_than_cache_time() {
    let slot = stored_at(Duration::ZERO);
    assert!(!slot.is_expired(SEC, SEC));
    assert!(slot.is_expired(SEC + Duration::from_nanos(1), SEC));
  }

  #[test]
  fn empty_slot_is_neither_fresh_nor_expired() {
    let slot: Slot<(), ()> = Slot::empty();
    assert!(!slot.is_fresh(Duration::ZERO, SEC));
    assert!(!slot.is_expired(SEC * 100, SEC));
    assert!(slot.is_vacant());
  }

  fn in_flight(ticket: u64) -> InFlight<(), ()> {
    InFlight {
      ticket,
      future: Arc::new(LoadFuture::new()),
    }
  }

  #[test]
  fn retiring_current_fetch_restores_the_one_it_replaced() {
    let mut slot: Slot<(), ()> = Slot::empty();
    assert_eq!(slot.supersede(in_flight(1)), None);
    assert_eq!(slot.supersede(in_flight(2)), Some(1));

    assert!(slot.retire(2));
    assert_eq!(slot.in_flight_ticket(), Some(1));
    assert!(slot.retire(1));
    assert!(slot.is_vacant());
  }

  #[test]
  fn retiring_a_replaced_fetch_keeps_the_current_one() {
    let mut slot: Slot<(), ()> = Slot::empty();
    slot.supersede(in_flight(1));
    slot.supersede(in_flight(2));

    assert!(slot.retire(1));
    assert_eq!(slot.in_flight_ticket(), Some(2));
    assert!(slot.superseded.is_empty());
    assert!(!slot.retire(7));
  }

  #[test]
  fn zero_stale_time_is_never_fresh() {
    let slot = stored_at(SEC);
    assert!(!slot.is_fresh(SEC, Duration::ZERO));
  }
}
