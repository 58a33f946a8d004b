use super::raw::{ConfigRaw, OptionsRaw};
use super::{CacheOptions, Preset};
use crate::error::{ConfigError, Result};

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::warn;

/// Cache timing for a set of resources, usually loaded from YAML:
///
/// ```yaml
/// defaults:
///   stale_time: 5m
///   cache_time: 10m
/// resources:
///   admin-bookings:
///     stale_time: 1m
///     cache_time: 3m
///   admin-stats:
///     stale_time: "0"
/// ```
///
/// A resource that leaves a field out inherits it from `defaults`, and
/// `defaults` falls back to 5 minutes / 10 minutes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryConfig {
  pub defaults: CacheOptions,
  pub resources: HashMap<String, CacheOptions>,
}

impl QueryConfig {
  /// A config holding the timing of every built-in admin console resource.
  pub fn admin_presets() -> Self {
    Self {
      defaults: CacheOptions::default(),
      resources: Preset::ALL
        .into_iter()
        .map(|preset| (preset.key().to_string(), preset.options()))
        .collect(),
    }
  }

  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    let raw: ConfigRaw =
      serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Self::from_raw(raw)
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let contents = std::fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }

  /// The options for `key`, or the defaults when it is not configured.
  pub fn options_for(&self, key: &str) -> CacheOptions {
    self.resources.get(key).copied().unwrap_or(self.defaults)
  }

  fn from_raw(raw: ConfigRaw) -> Result<Self> {
    let defaults = resolve("defaults", &raw.defaults, CacheOptions::default())?;

    let mut resources = HashMap::with_capacity(raw.resources.len());
    for (key, options) in &raw.resources {
      if key.is_empty() {
        return Err(ConfigError::InvalidValue {
          field: "resources".to_string(),
          message: "resource keys cannot be empty".to_string(),
        });
      }
      let resolved = resolve(key, options, defaults)?;
      if !resolved.is_consistent() {
        warn!(
          key = key.as_str(),
          stale_time = ?resolved.stale_time,
          cache_time = ?resolved.cache_time,
          "cache_time is shorter than stale_time; entries will expire before they go stale"
        );
      }
      resources.insert(key.clone(), resolved);
    }

    Ok(Self {
      defaults,
      resources,
    })
  }
}

fn resolve(scope: &str, raw: &OptionsRaw, base: CacheOptions) -> Result<CacheOptions> {
  let mut options = base;
  if let Some(value) = &raw.stale_time {
    options.stale_time = parse_duration(scope, "stale_time", value)?;
  }
  if let Some(value) = &raw.cache_time {
    options.cache_time = parse_duration(scope, "cache_time", value)?;
  }
  Ok(options)
}

fn parse_duration(scope: &str, field: &str, value: &str) -> Result<Duration> {
  let value = value.trim();
  if value == "0" {
    return Ok(Duration::ZERO);
  }
  humantime::parse_duration(value).map_err(|e| ConfigError::InvalidValue {
    field: format!("{scope}.{field}"),
    message: format!("'{value}': {e}"),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  const MIN: Duration = Duration::from_secs(60);

  #[test]
  fn resources_inherit_missing_fields_from_defaults() {
    let config = QueryConfig::from_yaml_str(
      r#"
defaults:
  stale_time: 2m
  cache_time: 20m
resources:
  admin-bookings:
    stale_time: 30s
"#,
    )
    .unwrap();

    assert_eq!(config.defaults, CacheOptions::new(MIN * 2, MIN * 20));
    assert_eq!(
      config.options_for("admin-bookings"),
      CacheOptions::new(Duration::from_secs(30), MIN * 20)
    );
    assert_eq!(config.options_for("unknown"), config.defaults);
  }

  #[test]
  fn empty_document_uses_builtin_defaults() {
    let config = QueryConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, QueryConfig::default());
  }

  #[test]
  fn zero_without_unit_is_accepted() {
    let config = QueryConfig::from_yaml_str(
      r#"
resources:
  admin-stats:
    stale_time: "0"
    cache_time: 1m
"#,
    )
    .unwrap();
    assert_eq!(config.options_for("admin-stats"), Preset::AdminStats.options());
  }

  #[test]
  fn bad_duration_names_the_field() {
    let err = QueryConfig::from_yaml_str(
      r#"
resources:
  admin-trips:
    cache_time: soon
"#,
    )
    .unwrap_err();

    match err {
      ConfigError::InvalidValue { field, .. } => assert_eq!(field, "admin-trips.cache_time"),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn unknown_fields_are_rejected() {
    let err = QueryConfig::from_yaml_str("defaults:\n  ttl: 5m\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
  }

  #[test]
  fn admin_presets_cover_every_preset() {
    let config = QueryConfig::admin_presets();
    for preset in Preset::ALL {
      assert_eq!(config.options_for(preset.key()), preset.options());
    }
  }
}
