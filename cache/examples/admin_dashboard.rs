use fibre_query::group::{first_error, refresh_all, Refresh};
use fibre_query::{FetchCacheBuilder, Preset};
use std::fmt;
use tokio::time::{sleep, Duration};

#[derive(Debug)]
struct Stats {
  trips: u32,
  bookings: u32,
}

#[derive(Debug)]
struct Activity {
  entries: Vec<String>,
}

#[derive(Debug)]
struct ApiError(String);

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "api error: {}", self.0)
  }
}

impl std::error::Error for ApiError {}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter("fibre_query=debug")
    .init();

  let stats = FetchCacheBuilder::from_preset(Preset::AdminStats)
    .build(|| async {
      sleep(Duration::from_millis(150)).await; // Simulate a slow request
      Ok::<_, ApiError>(Stats {
        trips: 12,
        bookings: 87,
      })
    })
    .unwrap();

  let activity = FetchCacheBuilder::from_preset(Preset::AdminActivity)
    .build(|| async {
      sleep(Duration::from_millis(50)).await;
      Ok::<_, ApiError>(Activity {
        entries: vec!["booking #1042 confirmed".to_string()],
      })
    })
    .unwrap();

  let panels: [&dyn Refresh; 2] = [&stats, &activity];

  println!("--- Dashboard refresh (both panels concurrently) ---");
  let outcomes = refresh_all(&panels).await;
  for outcome in &outcomes {
    println!("{}: {}", outcome.key, if outcome.is_ok() { "ok" } else { "failed" });
  }
  if let Some(failed) = first_error(&outcomes) {
    println!("First error: {:?}", failed.result);
  }

  println!("\nStats: {:?}", stats.data());
  println!("Activity: {:?}", activity.data());
}
