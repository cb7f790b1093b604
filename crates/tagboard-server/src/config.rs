//! Runtime configuration.
//!
//! Read from an optional TOML file, then overridden by `TAGBOARD_*`
//! environment variables. Nested keys use `__`, so `session.secret` is
//! `TAGBOARD_SESSION__SECRET`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use config::{
  Config, Environment, File,
  builder::{ConfigBuilder, DefaultState},
};
use serde::Deserialize;
use tagboard_core::{Error, deadline::Deadline, session::MIN_SECRET_BYTES};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Per-operation store deadline, and the timeout of each upstream request.
  #[serde(default = "default_request_timeout_ms")]
  pub request_timeout_ms: u64,
  #[serde(default)]
  pub session:            SessionConfig,
  #[serde(default)]
  pub oauth:              OAuthConfig,
  #[serde(default)]
  pub youtube:            YouTubeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
  /// HMAC key for session tokens; at least 32 bytes.
  #[serde(default)]
  pub secret:         String,
  #[serde(default = "default_lifetime_hours")]
  pub lifetime_hours: u64,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      secret:         String::new(),
      lifetime_hours: default_lifetime_hours(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthConfig {
  #[serde(default)]
  pub client_id:     String,
  #[serde(default)]
  pub client_secret: String,
  #[serde(default)]
  pub redirect_url:  String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YouTubeConfig {
  #[serde(default)]
  pub api_key: String,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("tagboard.db") }
fn default_request_timeout_ms() -> u64 { 3000 }
fn default_lifetime_hours() -> u64 { 24 }

impl ServerConfig {
  /// Load from `path` (skipped if absent) layered under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      Config::builder()
        .add_source(File::from(path.to_path_buf()).required(false))
        .add_source(
          Environment::with_prefix("TAGBOARD")
            .prefix_separator("_")
            .separator("__"),
        ),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  /// Refuse to start without the secrets the service cannot run without.
  pub fn validate(&self) -> Result<(), Error> {
    let missing = |what: &str| Err(Error::Configuration(format!("{what} is not set")));

    if self.session.secret.len() < MIN_SECRET_BYTES {
      return Err(Error::Configuration(format!(
        "session.secret must be at least {MIN_SECRET_BYTES} bytes"
      )));
    }
    if self.session.lifetime_hours == 0 {
      return Err(Error::Configuration("session.lifetime_hours must be positive".into()));
    }
    if self.request_timeout_ms == 0 {
      return Err(Error::Configuration("request_timeout_ms must be positive".into()));
    }
    if self.oauth.client_id.is_empty() {
      return missing("oauth.client_id");
    }
    if self.oauth.client_secret.is_empty() {
      return missing("oauth.client_secret");
    }
    if self.oauth.redirect_url.is_empty() {
      return missing("oauth.redirect_url");
    }
    if self.youtube.api_key.is_empty() {
      return missing("youtube.api_key");
    }
    Ok(())
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn request_timeout(&self) -> Duration { Duration::from_millis(self.request_timeout_ms) }

  pub fn deadline(&self) -> Deadline { Deadline::new(self.request_timeout()) }

  pub fn session_lifetime(&self) -> Duration {
    Duration::from_secs(self.session.lifetime_hours.saturating_mul(60 * 60))
  }

  /// `store_path` with a leading `~` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
