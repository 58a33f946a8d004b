use fibre_query::{FetchCacheBuilder, ManualClock};
use std::sync::{
  atomic::{AtomicBool, AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;

#[derive(Debug)]
struct Trip {
  route: &'static str,
  seats_left: usize,
}

#[derive(Debug)]
struct ApiError(&'static str);

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter("fibre_query=debug")
    .init();

  let calls = Arc::new(AtomicUsize::new(0));
  let offline = Arc::new(AtomicBool::new(false));
  let clock = ManualClock::new();

  let trips = FetchCacheBuilder::new("admin-trips")
    .stale_time(Duration::from_secs(120))
    .cache_time(Duration::from_secs(300))
    .clock(clock.clone())
    .build({
      let calls = calls.clone();
      let offline = offline.clone();
      move || {
        let version = calls.fetch_add(1, Ordering::SeqCst) + 1;
        let offline = offline.load(Ordering::SeqCst);
        async move {
          println!("[Backend] GET /admin/trips (request #{})", version);
          if offline {
            return Err(ApiError("network unreachable"));
          }
          Ok(vec![Trip {
            route: "Lisbon → Porto",
            seats_left: 40 - version,
          }])
        }
      }
    })
    .unwrap();

  println!("--- Step 1: Screen focused, first load ---");
  let first = trips.on_focus().await.unwrap();
  println!("Received: {:?}", first);

  println!("\n--- Step 2: Focused again a minute later (fresh) ---");
  clock.advance(Duration::from_secs(60));
  trips.on_focus().await.unwrap();
  assert_eq!(calls.load(Ordering::SeqCst), 1);
  println!("Served from cache, backend calls: {}", calls.load(Ordering::SeqCst));

  println!("\n--- Step 3: Pull to refresh while offline ---");
  offline.store(true, Ordering::SeqCst);
  let err = trips.refresh().await.unwrap_err();
  println!("Refresh failed: {:?}", err);

  let state = trips.state();
  println!("Still showing: {:?}", state.data);
  println!("Alongside error: {:?}", state.error);
  assert!(state.is_stale_with_error());

  println!("\n--- Step 4: Back online, refresh again ---");
  offline.store(false, Ordering::SeqCst);
  let refreshed = trips.refresh().await.unwrap();
  println!("Received: {:?}", refreshed);
  assert!(trips.error().is_none());

  println!("\nMetrics: {:#?}", trips.metrics());
}
