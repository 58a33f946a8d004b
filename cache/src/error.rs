use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur when building a `FetchCache`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The cache key was empty. Every cached resource needs a name.
  #[error("cache key cannot be empty")]
  EmptyKey,
}

/// The error returned by `FetchCache::fetch_data`.
///
/// Errors produced by the injected fetch function are shared (`Arc`) so that
/// every caller attached to the same in-flight fetch, and the handle's
/// observed state, can hold the same error.
pub enum FetchError<E> {
  /// The injected fetch function failed.
  Failed(Arc<E>),
  /// The call that was running the fetch was dropped before the fetch
  /// finished, so no result will ever arrive for the callers waiting on it.
  Abandoned,
}

impl<E> FetchError<E> {
  /// Returns the error produced by the fetch function, if that is what failed.
  pub fn inner(&self) -> Option<&Arc<E>> {
    match self {
      FetchError::Failed(err) => Some(err),
      FetchError::Abandoned => None,
    }
  }

  pub fn is_abandoned(&self) -> bool {
    matches!(self, FetchError::Abandoned)
  }
}

// Manual impls: `E` itself need not be `Clone`, and the bounds stay on `E`.
impl<E> Clone for FetchError<E> {
  fn clone(&self) -> Self {
    match self {
      FetchError::Failed(err) => FetchError::Failed(err.clone()),
      FetchError::Abandoned => FetchError::Abandoned,
    }
  }
}

impl<E: fmt::Debug> fmt::Debug for FetchError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FetchError::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
      FetchError::Abandoned => f.write_str("Abandoned"),
    }
  }
}

impl<E: fmt::Display> fmt::Display for FetchError<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FetchError::Failed(err) => write!(f, "fetch failed: {err}"),
      FetchError::Abandoned => f.write_str("the in-flight fetch was dropped before it completed"),
    }
  }
}

impl<E> std::error::Error for FetchError<E>
where
  E: std::error::Error + 'static,
{
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      FetchError::Failed(err) => Some(&**err),
      FetchError::Abandoned => None,
    }
  }
}

impl<E: PartialEq> PartialEq for FetchError<E> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (FetchError::Failed(a), FetchError::Failed(b)) => a == b,
      (FetchError::Abandoned, FetchError::Abandoned) => true,
      _ => false,
    }
  }
}

/// Errors raised while loading a `QueryConfig`.
#[cfg(feature = "config")]
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read configuration file: {0}")]
  Read(#[from] std::io::Error),

  #[error("failed to parse configuration: {0}")]
  Parse(String),

  #[error("invalid configuration value for '{field}': {message}")]
  InvalidValue { field: String, message: String },
}

/// A specialized `Result` type for configuration loading.
#[cfg(feature = "config")]
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
