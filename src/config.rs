use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
  clients::{DEFAULT_FETCH_TIMEOUT, DEFAULT_SPEC_BASE_URL},
  k8s::checks::DEFAULT_PAGE_SIZE,
  openapi::{
    MarkerRecognizer,
    recognizer::{DEFAULT_MARKER, DEFAULT_REMOVAL_PATTERN},
  },
  pool::{DEFAULT_CONCURRENCY, PoolOptions},
};

/// Top-level configuration loaded from `.deprecheck.yaml` or an explicit path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub source: SourceConfig,

  #[serde(default)]
  pub recognizer: RecognizerConfig,

  #[serde(default)]
  pub walk: WalkConfig,
}

/// Where the API specification is downloaded from and how long snapshots are reused.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,

  /// Hours a cached development snapshot is reused before downloading it again.
  /// Release tags never expire.
  #[serde(default = "default_snapshot_max_age_hours")]
  pub snapshot_max_age_hours: u64,

  /// Seconds allowed for downloading the specification before giving up.
  #[serde(default = "default_fetch_timeout_secs")]
  pub fetch_timeout_secs: u64,
}

fn default_base_url() -> String {
  DEFAULT_SPEC_BASE_URL.to_string()
}

fn default_snapshot_max_age_hours() -> u64 {
  24
}

fn default_fetch_timeout_secs() -> u64 {
  DEFAULT_FETCH_TIMEOUT.as_secs()
}

const SECONDS_PER_HOUR: u64 = 60 * 60;

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      snapshot_max_age_hours: default_snapshot_max_age_hours(),
      fetch_timeout_secs: default_fetch_timeout_secs(),
    }
  }
}

impl SourceConfig {
  pub fn snapshot_max_age(&self) -> Duration {
    Duration::from_secs(self.snapshot_max_age_hours.saturating_mul(SECONDS_PER_HOUR))
  }

  pub fn fetch_timeout(&self) -> Duration {
    Duration::from_secs(self.fetch_timeout_secs)
  }
}

/// Text convention used to recognize deprecated definitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecognizerConfig {
  #[serde(default = "default_marker")]
  pub marker: String,

  /// Regular expression whose first capture group is the removal version.
  #[serde(default = "default_removal_pattern")]
  pub removal_pattern: String,
}

fn default_marker() -> String {
  DEFAULT_MARKER.to_string()
}

fn default_removal_pattern() -> String {
  DEFAULT_REMOVAL_PATTERN.to_string()
}

impl Default for RecognizerConfig {
  fn default() -> Self {
    Self {
      marker: default_marker(),
      removal_pattern: default_removal_pattern(),
    }
  }
}

impl RecognizerConfig {
  pub fn build(&self) -> Result<MarkerRecognizer> {
    Ok(MarkerRecognizer::new(&self.marker, &self.removal_pattern)?)
  }
}

/// Limits for walking the objects stored in the cluster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalkConfig {
  /// Maximum number of list calls in flight (default 8).
  #[serde(default = "default_concurrency")]
  pub concurrency: usize,

  /// Objects requested per list call (default 500).
  #[serde(default = "default_page_size")]
  pub page_size: u32,

  /// Minimum delay between two list calls being started, 0 disables pacing.
  #[serde(default)]
  pub min_interval_ms: u64,

  /// Resource types to skip, as `group` or `group/Kind`. The core group is `""`.
  #[serde(default)]
  pub ignore: Vec<String>,
}

fn default_concurrency() -> usize {
  DEFAULT_CONCURRENCY
}

fn default_page_size() -> u32 {
  DEFAULT_PAGE_SIZE
}

impl Default for WalkConfig {
  fn default() -> Self {
    Self {
      concurrency: default_concurrency(),
      page_size: default_page_size(),
      min_interval_ms: 0,
      ignore: Vec::new(),
    }
  }
}

impl WalkConfig {
  pub fn pool(&self) -> PoolOptions {
    PoolOptions {
      concurrency: self.concurrency,
      min_interval: Duration::from_millis(self.min_interval_ms),
    }
  }
}

const DEFAULT_CONFIG_FILE: &str = ".deprecheck.yaml";

/// Load configuration from an explicit path, the default `.deprecheck.yaml` in the
/// current working directory, or fall back to `Config::default()`.
pub fn load(path: Option<&str>) -> Result<Config> {
  load_from(path, std::env::current_dir().ok().as_deref())
}

fn load_from(path: Option<&str>, base_dir: Option<&std::path::Path>) -> Result<Config> {
  let config = match (path, base_dir) {
    (Some(p), _) => Some(read(std::path::Path::new(p))?),
    (None, Some(dir)) if dir.join(DEFAULT_CONFIG_FILE).exists() => Some(read(&dir.join(DEFAULT_CONFIG_FILE))?),
    _ => None,
  };

  let config = config.unwrap_or_default();
  config.validate()?;
  Ok(config)
}

fn read(path: &std::path::Path) -> Result<Config> {
  let contents =
    std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
  serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

impl Config {
  fn validate(&self) -> Result<()> {
    if self.walk.concurrency == 0 {
      anyhow::bail!("walk.concurrency must be at least 1");
    }
    if self.walk.page_size == 0 {
      anyhow::bail!("walk.page_size must be at least 1");
    }
    if self.source.snapshot_max_age_hours.checked_mul(SECONDS_PER_HOUR).is_none() {
      anyhow::bail!(
        "source.snapshot_max_age_hours must be at most {}",
        u64::MAX / SECONDS_PER_HOUR
      );
    }
    if self.source.fetch_timeout_secs == 0 {
      anyhow::bail!("source.fetch_timeout_secs must be at least 1");
    }
    self.recognizer.build().context("Invalid recognizer configuration")?;

    Ok(())
  }
}
