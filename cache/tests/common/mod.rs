#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fibre_query::{FetchCache, FetchCacheBuilder, ManualClock};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestError(pub String);

impl fmt::Display for TestError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "backend error: {}", self.0)
  }
}

impl std::error::Error for TestError {}

/// A fake REST backend. Every call is counted before it does anything else,
/// so `calls()` is exactly the number of times the cache invoked the fetch.
/// The n-th call answers `"v{n}"`.
#[derive(Clone, Default)]
pub struct Backend {
  calls: Arc<AtomicUsize>,
  fail: Arc<AtomicBool>,
  gate: Option<Arc<Semaphore>>,
  call_gates: Option<Arc<Vec<Semaphore>>>,
  delay: Option<Duration>,
}

impl Backend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Calls block until `release` hands out a permit.
  pub fn gated() -> Self {
    Self {
      gate: Some(Arc::new(Semaphore::new(0))),
      ..Self::default()
    }
  }

  /// Each of the first `calls` calls blocks until `release_call` opens its
  /// own gate, so calls can be made to finish in any order.
  pub fn gated_per_call(calls: usize) -> Self {
    Self {
      call_gates: Some(Arc::new((0..calls).map(|_| Semaphore::new(0)).collect())),
      ..Self::default()
    }
  }

  /// Calls take `delay` to answer.
  pub fn slow(delay: Duration) -> Self {
    Self {
      delay: Some(delay),
      ..Self::default()
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn set_failing(&self, fail: bool) {
    self.fail.store(fail, Ordering::SeqCst);
  }

  pub fn release(&self, permits: usize) {
    if let Some(gate) = &self.gate {
      gate.add_permits(permits);
    }
  }

  /// Lets the `n`-th call (1-based) answer.
  pub fn release_call(&self, n: usize) {
    if let Some(gates) = &self.call_gates {
      gates[n - 1].add_permits(1);
    }
  }

  pub async fn call(self) -> Result<String, TestError> {
    let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(gate) = &self.gate {
      gate.acquire().await.expect("gate closed").forget();
    }
    if let Some(gates) = &self.call_gates {
      gates[n - 1].acquire().await.expect("gate closed").forget();
    }
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    if self.fail.load(Ordering::SeqCst) {
      return Err(TestError(format!("call {n} failed")));
    }
    Ok(format!("v{n}"))
  }
}

/// Builds a cache over `backend` with the given windows in milliseconds.
pub fn build_cache(
  backend: &Backend,
  clock: &ManualClock,
  stale_ms: u64,
  cache_ms: u64,
) -> FetchCache<String, TestError> {
  let backend = backend.clone();
  FetchCacheBuilder::new("test-resource")
    .clock(clock.clone())
    .stale_time(Duration::from_millis(stale_ms))
    .cache_time(Duration::from_millis(cache_ms))
    .build(move || backend.clone().call())
    .unwrap()
}

pub fn ms(n: u64) -> Duration {
  Duration::from_millis(n)
}

/// Polls `cond` until it holds, yielding to other tasks in between.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
  for _ in 0..5_000 {
    if cond() {
      return;
    }
    tokio::time::sleep(Duration::from_millis(1)).await;
  }
  panic!("condition not reached in time");
}
