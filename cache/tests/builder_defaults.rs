use fibre_query::{BuildError, CacheOptions, FetchCache, FetchCacheBuilder, Preset};
use std::time::Duration;

type Cache = FetchCache<u32, std::io::Error>;

#[test]
fn test_default_windows() {
  let cache: Cache = FetchCache::new("admin-users", || async { Ok(1) }).unwrap();
  let options = cache.options();
  assert_eq!(options.stale_time, Duration::from_secs(5 * 60));
  assert_eq!(options.cache_time, Duration::from_secs(10 * 60));
  assert_eq!(options, CacheOptions::default());
}

#[test]
fn test_empty_key_is_rejected() {
  let err = FetchCacheBuilder::<u32, std::io::Error>::new("")
    .build(|| async { Ok(1) })
    .unwrap_err();
  assert_eq!(err, BuildError::EmptyKey);
}

#[test]
fn test_preset_sets_key_and_windows() {
  let cache: Cache = FetchCacheBuilder::from_preset(Preset::AdminBookings)
    .build(|| async { Ok(1) })
    .unwrap();
  assert_eq!(cache.key(), "admin-bookings");
  assert_eq!(cache.options().stale_time, Duration::from_secs(60));
  assert_eq!(cache.options().cache_time, Duration::from_secs(180));
}

#[test]
fn test_explicit_windows_override_defaults() {
  let cache: Cache = FetchCache::builder("admin-activity")
    .stale_time(Duration::from_secs(30))
    .cache_time(Duration::from_secs(120))
    .build(|| async { Ok(1) })
    .unwrap();
  assert_eq!(
    cache.options(),
    CacheOptions::new(Duration::from_secs(30), Duration::from_secs(120))
  );
  assert!(cache.store().is_empty());
  assert!(cache.state().data.is_none());
}
