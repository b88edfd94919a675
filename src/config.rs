use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TrackerError};
use crate::retention::RetentionPolicy;

/// Tracker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
  pub remote: RemoteConfig,
  /// How often the local mirror is resynced from the remote store, and how
  /// old a mirror may get before it counts as stale.
  #[serde(default = "default_sync_interval_secs")]
  pub sync_interval_secs: u64,
  #[serde(default)]
  pub retention: RetentionConfig,
  /// Override for the cache database location (defaults to the platform data
  /// directory).
  pub cache_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
  /// Base URL of the document store, e.g. `https://store.example/api/`.
  pub base_url: String,
  /// Collection name, e.g. `chars`.
  #[serde(default = "default_collection")]
  pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
  /// Days before a `needs` record expires.
  #[serde(default = "default_needs_ttl_days")]
  pub needs_ttl_days: u32,
  /// Days before a `has` record expires.
  #[serde(default = "default_has_ttl_days")]
  pub has_ttl_days: u32,
}

fn default_sync_interval_secs() -> u64 {
  20 * 60
}

fn default_collection() -> String {
  "chars".to_string()
}

fn default_needs_ttl_days() -> u32 {
  7
}

fn default_has_ttl_days() -> u32 {
  30
}

impl Default for RetentionConfig {
  fn default() -> Self {
    Self {
      needs_ttl_days: default_needs_ttl_days(),
      has_ttl_days: default_has_ttl_days(),
    }
  }
}

impl TrackerConfig {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./itemtrack.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/itemtrack/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(TrackerError::Config(format!(
          "Config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(TrackerError::Config(
        "No configuration file found. Create one at ~/.config/itemtrack/config.yaml".into(),
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("itemtrack.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("itemtrack").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
      TrackerError::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config: TrackerConfig = serde_yaml::from_str(&contents).map_err(|e| {
      TrackerError::Config(format!(
        "Failed to parse config file {}: {}",
        path.display(),
        e
      ))
    })?;

    Ok(config)
  }

  /// Config for an embedded/test setup with in-process backends: default
  /// intervals and retention, remote endpoint unused.
  pub fn for_embedded() -> Self {
    Self {
      remote: RemoteConfig {
        base_url: "http://localhost/".into(),
        collection: default_collection(),
      },
      sync_interval_secs: default_sync_interval_secs(),
      retention: RetentionConfig::default(),
      cache_path: None,
    }
  }

  pub fn sync_interval_ms(&self) -> i64 {
    self.sync_interval_secs as i64 * 1000
  }

  pub fn retention_policy(&self) -> RetentionPolicy {
    RetentionPolicy::from_days(self.retention.needs_ttl_days, self.retention.has_ttl_days)
  }
}
