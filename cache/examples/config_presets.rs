use fibre_query::{FetchCacheBuilder, Preset, QueryConfig};

const YAML: &str = r#"
defaults:
  stale_time: 5m
  cache_time: 10m
resources:
  admin-bookings:
    stale_time: 30s
    cache_time: 2m
"#;

#[tokio::main]
async fn main() {
  println!("--- Built-in presets ---");
  for preset in Preset::ALL {
    let options = preset.options();
    println!(
      "{:<16} stale after {:>4}s, evicted after {:>4}s",
      preset.key(),
      options.stale_time.as_secs(),
      options.cache_time.as_secs()
    );
  }

  println!("\n--- Options from YAML ---");
  let config = QueryConfig::from_yaml_str(YAML).expect("valid config");
  println!("admin-bookings: {:?}", config.options_for("admin-bookings"));
  println!("admin-users:    {:?}", config.options_for("admin-users"));

  let bookings = FetchCacheBuilder::new("admin-bookings")
    .config(&config)
    .build(|| async { Ok::<_, std::io::Error>(vec!["#1042", "#1043"]) })
    .unwrap();

  let loaded = bookings.fetch_data(false).await.unwrap();
  println!("\nLoaded {} bookings with {:?}", loaded.len(), bookings.options());
}
