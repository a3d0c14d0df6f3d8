//! Server configuration: an optional TOML file overlaid by `SEEK_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use seek_embed::ProviderConfig;
use seek_store_sqlite::StoreConfig;
use serde::Deserialize;

pub const DEFAULT_DATABASE_PATH: &str = "~/.local/share/seek/knowledge.db";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_database_path")]
  pub database_path:   PathBuf,
  #[serde(default = "default_retention_depth")]
  pub retention_depth: usize,
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms: u64,
  #[serde(default)]
  pub embedding:       ProviderConfig,
}

fn default_database_path() -> PathBuf { PathBuf::from(DEFAULT_DATABASE_PATH) }

fn default_retention_depth() -> usize { seek_store_sqlite::DEFAULT_RETENTION_DEPTH }

fn default_busy_timeout_ms() -> u64 {
  seek_store_sqlite::DEFAULT_BUSY_TIMEOUT.as_millis() as u64
}

impl ServerConfig {
  /// Read `path` if it exists, then apply the environment, e.g.
  /// `SEEK_DATABASE_PATH` or `SEEK_EMBEDDING__API_KEY`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let cfg: Self = Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("SEEK")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()?;
    Ok(cfg.resolve(std::env::var("OPENAI_API_KEY").ok(), std::env::var("HOME").ok()))
  }

  /// Fill the API key from the conventional variable when none is
  /// configured, and expand a leading `~` in the database path.
  pub fn resolve(mut self, openai_api_key: Option<String>, home: Option<String>) -> Self {
    if self.embedding.api_key.is_none() {
      self.embedding.api_key = openai_api_key.filter(|k| !k.trim().is_empty());
    }
    self.database_path = expand_tilde(&self.database_path, home.as_deref());
    self
  }

  /// Store settings for an embedder producing `dimensions`-wide vectors.
  pub fn store_config(&self, dimensions: usize) -> StoreConfig {
    StoreConfig::new(dimensions)
      .with_retention_depth(self.retention_depth)
      .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
  }
}

/// Expand a leading `~` to `home`.
fn expand_tilde(path: &Path, home: Option<&str>) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(home) = home {
    if s == "~" {
      return PathBuf::from(home);
    }
    if let Some(rest) = s.strip_prefix("~/") {
      return PathBuf::from(home).join(rest);
    }
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use seek_embed::ProviderKind;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    Config::builder()
      .add_source(File::from(file.path()))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn defaults_apply_to_empty_file() {
    let cfg = parse("");
    assert_eq!(cfg.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
    assert_eq!(cfg.retention_depth, 5);
    assert_eq!(cfg.busy_timeout_ms, 5000);
    assert_eq!(cfg.embedding.provider, ProviderKind::OpenAi);
    assert!(cfg.embedding.api_key.is_none());
  }

  #[test]
  fn file_values_are_read() {
    let cfg = parse(
      r#"
        database_path = "/var/lib/seek/kb.db"
        retention_depth = 3

        [embedding]
        provider = "hash"
        dimensions = 128
      "#,
    );
    assert_eq!(cfg.database_path, PathBuf::from("/var/lib/seek/kb.db"));
    assert_eq!(cfg.retention_depth, 3);
    assert_eq!(cfg.embedding.provider, ProviderKind::Hash);
    assert_eq!(cfg.embedding.dimensions, Some(128));

    let store = cfg.store_config(128);
    assert_eq!(store.retention_depth, 3);
    assert_eq!(store.busy_timeout, Duration::from_secs(5));
  }

  #[test]
  fn resolve_expands_home_and_fills_key() {
    let cfg = parse("").resolve(Some("sk-test".into()), Some("/home/ada".into()));
    assert_eq!(
      cfg.database_path,
      PathBuf::from("/home/ada/.local/share/seek/knowledge.db")
    );
    assert_eq!(cfg.embedding.api_key.as_deref(), Some("sk-test"));
  }

  #[test]
  fn configured_key_wins() {
    let cfg = parse("[embedding]\napi_key = \"from-file\"\n")
      .resolve(Some("from-env".into()), None);
    assert_eq!(cfg.embedding.api_key.as_deref(), Some("from-file"));
    assert_eq!(cfg.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
  }
}
