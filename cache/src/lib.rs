//! A memoized, per-key fetch cache for async clients.
//!
//! A [`FetchCache`] wraps one resource (a list of trips, the users of an
//! admin console, dashboard statistics) and the async function that fetches
//! it. Calling [`FetchCache::fetch_data`] returns the cached value while it
//! is fresh and fetches otherwise.
//!
//! # Features
//! - **Freshness and expiry**: values younger than `stale_time` are served
//!   without fetching; values older than `cache_time` are dropped on the next
//!   access. No background timers are involved.
//! - **In-flight deduplication**: concurrent calls for the same key share one
//!   fetch.
//! - **Stale-while-error**: a failed refresh reports its error while the last
//!   good value stays visible.
//! - **Generation checks**: a fetch whose key was invalidated, cleared or
//!   superseded while it ran does not write its result back.
//! - **Observability**: `tracing` events at every decision point, per-store
//!   metrics and eviction listeners.
//! - **Configuration**: builder options, built-in presets and (with the
//!   `config` feature) YAML files with human-readable durations.
//!
//! ```
//! use fibre_query::FetchCache;
//!
//! # futures_executor::block_on(async {
//! let users = FetchCache::new("admin-users", || async {
//!   Ok::<_, std::io::Error>(vec!["ana", "rui"])
//! })
//! .unwrap();
//!
//! let first = users.fetch_data(false).await.unwrap();
//! let second = users.fetch_data(false).await.unwrap();
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! assert_eq!(users.metrics().fetches(), 1);
//! # });
//! ```

// Public modules that form the API
pub mod builder;
pub mod config;
pub mod error;
pub mod group;
pub mod handle;
pub mod listener;
pub mod metrics;
pub mod state;
pub mod store;
pub mod time;

// Internal, crate-only modules
mod entry;
mod loader;

// Re-export the primary user-facing types for convenience
pub use builder::FetchCacheBuilder;
pub use config::{CacheOptions, Preset};
pub use error::{BuildError, FetchError};
pub use handle::FetchCache;
pub use listener::{EvictionListener, EvictionReason};
pub use metrics::MetricsSnapshot;
pub use state::FetchState;
pub use store::CacheStore;
pub use time::{Clock, ManualClock, SystemClock};

#[cfg(feature = "config")]
pub use config::QueryConfig;
#[cfg(feature = "config")]
pub use error::ConfigError;
