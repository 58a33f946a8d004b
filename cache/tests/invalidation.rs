mod common;

use common::{build_cache, ms, wait_until, Backend, TestError};
use fibre_query::{CacheStore, EvictionReason, FetchCacheBuilder, ManualClock};
use parking_lot::Mutex;
use std::sync::Arc;

#[tokio::test]
async fn test_invalidate_forces_next_fetch() {
  let backend = Backend::new();
  let clock = ManualClock::new();
  let cache = build_cache(&backend, &clock, 60_000, 120_000);

  cache.fetch_data(false).await.unwrap();
  cache.invalidate_cache();

  // Well within staleTime, but the entry is gone.
  clock.set(ms(1));
  assert_eq!(*cache.fetch_data(false).await.unwrap(), "v2");
  assert_eq!(backend.calls(), 2);
  assert_eq!(cache.metrics().invalidations, 1);
}

#[tokio::test]
async fn test_invalidate_leaves_observed_data_alone() {
  let backend = Backend::new();
  let clock = ManualClock::new();
  let cache = build_cache(&backend, &clock, 60_000, 120_000);

  cache.fetch_data(false).await.unwrap();
  cache.invalidate_cache();

  assert!(cache.peek().is_none());
  assert_eq!(cache.data().as_deref().map(String::as_str), Some("v1"));
}

#[tokio::test]
async fn test_invalidate_on_missing_key_is_a_no_op() {
  let backend = Backend::new();
  let clock = ManualClock::new();
  let cache = build_cache(&backend, &clock, 60_000, 120_000);

  cache.invalidate_cache();
  assert!(!cache.store().invalidate("never-fetched"));
  assert_eq!(cache.metrics().invalidations, 0);
}

#[tokio::test]
async fn test_invalidate_during_in_flight_fetch_discards_write_back() {
  let backend = Backend::gated();
  let clock = ManualClock::new();
  let cache = build_cache(&backend, &clock, 60_000, 120_000);

  backend.release(1);
  assert_eq!(*cache.fetch_data(false).await.unwrap(), "v1");

  // Invalidate while a forced refresh is waiting on the backend.
  let (refreshed, ()) = tokio::join!(cache.fetch_data(true), async {
    wait_until(|| backend.calls() == 2).await;
    cache.invalidate_cache();
    backend.release(1);
  });

  // The caller still gets the value it asked for...
  assert_eq!(*refreshed.unwrap(), "v2");
  assert_eq!(cache.data().as_deref().map(String::as_str), Some("v2"));

  // ...but it is not resurrected into the store.
  assert!(cache.peek().is_none());
  assert!(cache.store().is_empty());
  assert_eq!(cache.metrics().discarded, 1);

  backend.release(1);
  assert_eq!(*cache.fetch_data(false).await.unwrap(), "v3");
  assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn test_clear_all_cache_clears_every_key_of_a_shared_store() {
  let backend = Backend::new();
  let clock = ManualClock::new();
  let store = Arc::new(CacheStore::<String, TestError>::new());

  let build = |key: &str| {
    let backend = backend.clone();
    FetchCacheBuilder::new(key)
      .clock(clock.clone())
      .store(store.clone())
      .build(move || backend.clone().call())
      .unwrap()
  };
  let trips = build("admin-trips");
  let users = build("admin-users");

  trips.fetch_data(false).await.unwrap();
  users.fetch_data(false).await.unwrap();
  assert_eq!(store.len(), 2);

  trips.clear_all_cache();
  assert!(store.is_empty());
  assert_eq!(store.metrics().cleared, 2);

  users.fetch_data(false).await.unwrap();
  assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn test_handles_sharing_a_store_share_entries() {
  let backend = Backend::new();
  let clock = ManualClock::new();
  let store = Arc::new(CacheStore::<String, TestError>::new());

  let build = || {
    let backend = backend.clone();
    FetchCacheBuilder::new("admin-routes")
      .clock(clock.clone())
      .store(store.clone())
      .build(move || backend.clone().call())
      .unwrap()
  };
  let screen_a = build();
  let screen_b = build();

  screen_a.fetch_data(false).await.unwrap();
  let value = screen_b.fetch_data(false).await.unwrap();
  assert_eq!(*value, "v1");
  assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_private_store_clear_is_scoped_to_its_handle() {
  let backend = Backend::new();
  let clock = ManualClock::new();
  let trips = build_cache(&backend, &clock, 60_000, 120_000);
  let users = build_cache(&backend, &clock, 60_000, 120_000);

  trips.fetch_data(false).await.unwrap();
  users.fetch_data(false).await.unwrap();

  trips.clear_all_cache();
  assert!(trips.peek().is_none());
  assert!(users.peek().is_some());
}

#[tokio::test]
async fn test_removals_are_reported_with_their_reason() {
  let backend = Backend::new();
  let clock = ManualClock::new();
  let log: Arc<Mutex<Vec<(String, EvictionReason)>>> = Arc::default();

  let store = {
    let log = log.clone();
    Arc::new(
      CacheStore::<String, TestError>::new().with_listener(
        move |key: &str, _value: Arc<String>, reason: EvictionReason| {
          log.lock().push((key.to_string(), reason));
        },
      ),
    )
  };
  let cache = {
    let backend = backend.clone();
    FetchCacheBuilder::new("admin-buses")
      .clock(clock.clone())
      .store(store)
      .build(move || backend.clone().call())
      .unwrap()
  };

  cache.fetch_data(false).await.unwrap();
  cache.invalidate_cache();
  cache.fetch_data(false).await.unwrap();
  cache.clear_all_cache();

  assert_eq!(
    *log.lock(),
    vec![
      ("admin-buses".to_string(), EvictionReason::Invalidated),
      ("admin-buses".to_string(), EvictionReason::Cleared),
    ]
  );
}
