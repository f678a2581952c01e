//! Runtime settings: TOML file, then `COURTWATCH_*` environment, then CLI
//! flags (applied by `main`).

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use courtwatch_core::{record::Dimension, session::FilterSelection};
use courtwatch_smartplay::DEFAULT_URL;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_source_url")]
  pub source_url:           String,
  #[serde(default = "default_poll_interval_secs")]
  pub poll_interval_secs:   u64,
  #[serde(default = "default_cache_ttl_secs")]
  pub cache_ttl_secs:       u64,
  #[serde(default = "default_request_timeout_secs")]
  pub request_timeout_secs: u64,
  /// Pre-grant alert permission (equivalent to pressing `n`).
  #[serde(default)]
  pub notifications:        bool,
  /// Where TUI mode writes logs. Without it, TUI mode logs nothing.
  #[serde(default)]
  pub log_file:             Option<PathBuf>,

  // Initial selections; empty levels fall back to the default policy.
  #[serde(default)]
  pub district: Vec<String>,
  #[serde(default)]
  pub venue:    Vec<String>,
  #[serde(default)]
  pub date:     Vec<String>,
  #[serde(default)]
  pub time:     Vec<String>,
}

fn default_source_url() -> String { DEFAULT_URL.to_owned() }
fn default_poll_interval_secs() -> u64 { 60 }
fn default_cache_ttl_secs() -> u64 { 30 * 60 }
fn default_request_timeout_secs() -> u64 { 15 }

impl Settings {
  /// Read `path` (optional) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("COURTWATCH").try_parsing(true))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs.max(1))
  }

  pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_secs) }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }

  pub fn initial_selection(&self) -> FilterSelection {
    FilterSelection::new()
      .with(Dimension::District, self.district.iter().cloned())
      .with(Dimension::Venue, self.venue.iter().cloned())
      .with(Dimension::Date, self.date.iter().cloned())
      .with(Dimension::Time, self.time.iter().cloned())
  }
}
