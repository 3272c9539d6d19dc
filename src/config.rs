//! Loading application configuration from TOML.
//!
//! See `AppConfig` for the expected schema. Every field has a default, so an
//! empty file (or no file at all) yields a working demo server.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::session::SessionPolicy;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub artifacts: ArtifactPaths,
  #[serde(default)]
  pub challenge: ChallengeConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host: [u8; 4],
  pub port: u16,
  /// Prefix every route is mounted under, e.g. "/tweetrater". Empty = root.
  pub route_prefix: String,
  pub static_dir: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host: [0, 0, 0, 0],
      port: 5001,
      route_prefix: String::new(),
      static_dir: PathBuf::from("./static"),
    }
  }
}

/// Exported model artifacts. When `tokenizer`, `model` and `dataset` are all
/// unset the built-in demo bundle is used; setting only some of them is an error.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct ArtifactPaths {
  #[serde(default)] pub tokenizer: Option<PathBuf>,
  #[serde(default)] pub model: Option<PathBuf>,
  #[serde(default)] pub dataset: Option<PathBuf>,
  /// Precomputed model labels over the test split. Computed at startup if unset.
  #[serde(default)] pub predictions: Option<PathBuf>,
}

impl ArtifactPaths {
  pub fn is_empty(&self) -> bool {
    self.tokenizer.is_none() && self.model.is_none() && self.dataset.is_none()
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
  pub session_policy: SessionPolicy,
  pub default_training_samples: usize,
  pub default_test_samples: usize,
  pub max_samples_per_request: usize,
  pub max_sessions: usize,
}

impl Default for ChallengeConfig {
  fn default() -> Self {
    Self {
      session_policy: SessionPolicy::Replace,
      default_training_samples: 10,
      default_test_samples: 20,
      max_samples_per_request: 100,
      max_sessions: 1024,
    }
  }
}

impl AppConfig {
  /// Normalized route prefix: either empty or "/something" without a trailing slash.
  pub fn route_prefix(&self) -> String {
    let trimmed = self.server.route_prefix.trim().trim_matches('/');
    if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
  }
}

/// Load `AppConfig` from TWEETRATER_CONFIG_PATH, then apply the PORT override.
/// A missing or broken file is logged and replaced by defaults.
pub fn load_app_config_from_env() -> AppConfig {
  let mut cfg = match std::env::var("TWEETRATER_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match toml::from_str::<AppConfig>(&s) {
        Ok(cfg) => {
          info!(target: "tweetrater", %path, "Loaded app config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "tweetrater", %path, error = %e, "Failed to parse TOML config; using defaults");
          AppConfig::default()
        }
      },
      Err(e) => {
        error!(target: "tweetrater", %path, error = %e, "Failed to read TOML config file; using defaults");
        AppConfig::default()
      }
    },
    Err(_) => AppConfig::default(),
  };

  if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
    cfg.server.port = port;
  }
  cfg
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_toml_gives_defaults() {
    let cfg: AppConfig = toml::from_str("").unwrap();
    assert_eq!(cfg.server.port, 5001);
    assert_eq!(cfg.challenge.session_policy, SessionPolicy::Replace);
    assert_eq!(cfg.challenge.default_test_samples, 20);
    assert!(cfg.artifacts.is_empty());
  }

  #[test]
  fn full_toml_parses() {
    let raw = r#"
      [server]
      port = 5000
      route_prefix = "/tweetrater/"

      [artifacts]
      tokenizer = "static/tokenizer.json"
      model = "static/model.json"
      dataset = "static/data.json"

      [challenge]
      session_policy = "append"
      default_training_samples = 5
    "#;
    let cfg: AppConfig = toml::from_str(raw).unwrap();
    assert_eq!(cfg.server.port, 5000);
    assert_eq!(cfg.route_prefix(), "/tweetrater");
    assert_eq!(cfg.challenge.session_policy, SessionPolicy::Append);
    assert_eq!(cfg.challenge.default_training_samples, 5);
    assert_eq!(cfg.challenge.default_test_samples, 20);
    assert!(!cfg.artifacts.is_empty());
    assert!(cfg.artifacts.predictions.is_none());
  }

  #[test]
  fn root_prefix_is_empty() {
    let mut cfg = AppConfig::default();
    cfg.server.route_prefix = "/".into();
    assert_eq!(cfg.route_prefix(), "");
  }
}
