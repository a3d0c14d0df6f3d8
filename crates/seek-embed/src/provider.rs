//! Runtime selection of an embedding provider.

use std::time::Duration;

use seek_core::embed::Embedder;
use serde::Deserialize;
use tracing::info;

use crate::{
  Error, HashEmbedder, OpenAiConfig, OpenAiEmbedder, Result, hash, openai,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
  #[default]
  OpenAi,
  Hash,
}

/// The `[embedding]` section of the server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
  #[serde(default)]
  pub provider:     ProviderKind,
  pub model:        Option<String>,
  pub base_url:     Option<String>,
  pub api_key:      Option<String>,
  /// Defaults to the model's native width (or 384 for `hash`).
  pub dimensions:   Option<usize>,
  pub timeout_secs: Option<u64>,
}

/// One of the concrete embedders, chosen by configuration.
#[derive(Clone)]
pub enum Provider {
  OpenAi(OpenAiEmbedder),
  Hash(HashEmbedder),
}

impl Provider {
  pub fn from_config(config: &ProviderConfig) -> Result<Self> {
    let provider = match config.provider {
      ProviderKind::Hash => Self::Hash(HashEmbedder::new(
        config.dimensions.unwrap_or(hash::DEFAULT_DIMENSIONS),
      )),
      ProviderKind::OpenAi => {
        let api_key = config.api_key.clone().ok_or(Error::MissingApiKey)?;
        let mut oc = OpenAiConfig::new(api_key);
        if let Some(model) = &config.model {
          oc = oc.with_model(model.clone());
        }
        if let Some(url) = &config.base_url {
          oc = oc.with_base_url(url.clone());
        }
        if let Some(dims) = config.dimensions {
          oc = oc.with_dimensions(dims);
        }
        oc = oc.with_timeout(
          config
            .timeout_secs
            .map_or(openai::DEFAULT_TIMEOUT, Duration::from_secs),
        );
        Self::OpenAi(OpenAiEmbedder::new(oc)?)
      }
    };

    info!(
      model = provider.model(),
      dimensions = provider.dimensions(),
      "embedding provider ready"
    );
    Ok(provider)
  }
}

impl Embedder for Provider {
  type Error = Error;

  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    match self {
      Self::OpenAi(e) => e.embed(text).await,
      Self::Hash(e) => e.embed(text).await,
    }
  }

  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    match self {
      Self::OpenAi(e) => e.embed_batch(texts).await,
      Self::Hash(e) => e.embed_batch(texts).await,
    }
  }

  fn dimensions(&self) -> usize {
    match self {
      Self::OpenAi(e) => e.dimensions(),
      Self::Hash(e) => e.dimensions(),
    }
  }

  fn model(&self) -> &str {
    match self {
      Self::OpenAi(e) => e.model(),
      Self::Hash(e) => e.model(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_provider_from_config() {
    let p = Provider::from_config(&ProviderConfig {
      provider: ProviderKind::Hash,
      dimensions: Some(12),
      ..Default::default()
    })
    .unwrap();
    assert!(matches!(p, Provider::Hash(_)));
    assert_eq!(p.dimensions(), 12);
  }

  #[test]
  fn openai_requires_key() {
    let err = Provider::from_config(&ProviderConfig::default()).err().unwrap();
    assert!(matches!(err, Error::MissingApiKey));
  }

  #[test]
  fn openai_model_sets_width() {
    let p = Provider::from_config(&ProviderConfig {
      model: Some("text-embedding-3-large".into()),
      api_key: Some("k".into()),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(p.dimensions(), 3072);
    assert_eq!(p.model(), "text-embedding-3-large");
  }

  #[test]
  fn kind_parses_lowercase() {
    let cfg: ProviderConfig =
      serde_json::from_str(r#"{"provider":"hash","dimensions":8}"#).unwrap();
    assert_eq!(cfg.provider, ProviderKind::Hash);
    assert_eq!(cfg.dimensions, Some(8));
  }
}
