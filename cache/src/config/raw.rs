use serde::Deserialize;
use std::collections::HashMap;

// --- Top Level Config ---
#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigRaw {
  #[serde(default)]
  pub defaults: OptionsRaw,
  #[serde(default)] // Resources can be empty, everything then uses the defaults
  pub resources: HashMap<String, OptionsRaw>,
}

// --- Per-resource timing ---
// Durations are humantime strings ("90s", "2m", "1h 30m").
#[derive(Debug, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct OptionsRaw {
  #[serde(default)]
  pub stale_time: Option<String>,
  #[serde(default)]
  pub cache_time: Option<String>,
}
