//! Driving several handles at once, the way a dashboard refreshes all of its
//! panels together.

use crate::FetchCache;

use std::error::Error as StdError;

use futures_util::future::{self, BoxFuture};

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// An object-safe view of a `FetchCache`, so handles with different payload
/// types can be grouped.
pub trait Refresh: Send + Sync {
  fn key(&self) -> &str;

  /// Runs `fetch_data(force_refresh)`, discarding the value.
  fn fetch_boxed(&self, force_refresh: bool) -> BoxFuture<'_, Result<(), BoxError>>;
}

impl<T, E> Refresh for FetchCache<T, E>
where
  T: Send + Sync + 'static,
  E: StdError + Send + Sync + 'static,
{
  fn key(&self) -> &str {
    FetchCache::key(self)
  }

  fn fetch_boxed(&self, force_refresh: bool) -> BoxFuture<'_, Result<(), BoxError>> {
    Box::pin(async move {
      self
        .fetch_data(force_refresh)
        .await
        .map(|_| ())
        .map_err(|e| Box::new(e) as BoxError)
    })
  }
}

/// The result of one handle in a group operation.
#[derive(Debug)]
pub struct GroupOutcome {
  pub key: String,
  pub result: Result<(), BoxError>,
}

impl GroupOutcome {
  pub fn is_ok(&self) -> bool {
    self.result.is_ok()
  }
}

/// Force-refreshes every handle concurrently. A failure in one handle does
/// not stop the others; outcomes are returned in input order.
pub async fn refresh_all(handles: &[&dyn Refresh]) -> Vec<GroupOutcome> {
  run_all(handles, true).await
}

/// Fetches every handle concurrently, using fresh cached values where there
/// are any.
pub async fn fetch_all(handles: &[&dyn Refresh]) -> Vec<GroupOutcome> {
  run_all(handles, false).await
}

/// The first failed outcome, if any.
pub fn first_error(outcomes: &[GroupOutcome]) -> Option<&GroupOutcome> {
  outcomes.iter().find(|outcome| !outcome.is_ok())
}

async fn run_all(handles: &[&dyn Refresh], force_refresh: bool) -> Vec<GroupOutcome> {
  let results = future::join_all(
    handles
      .iter()
      .map(|handle| handle.fetch_boxed(force_refresh)),
  )
  .await;

  handles
    .iter()
    .zip(results)
    .map(|(handle, result)| GroupOutcome {
      key: handle.key().to_string(),
      result,
    })
    .collect()
}
