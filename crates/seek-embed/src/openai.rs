//! Client for OpenAI-compatible embedding endpoints.

use std::time::Duration;

use reqwest::Client;
use seek_core::embed::Embedder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Native output width of the known OpenAI embedding models.
pub fn model_dimensions(model: &str) -> usize {
  match model {
    "text-embedding-3-large" => 3072,
    _ => 1536,
  }
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
  pub api_key:    String,
  pub base_url:   String,
  pub model:      String,
  /// Requested vector width; models of the `text-embedding-3` family can
  /// shorten their output on request.
  pub dimensions: usize,
  pub timeout:    Duration,
}

impl OpenAiConfig {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      api_key:    api_key.into(),
      base_url:   DEFAULT_BASE_URL.to_owned(),
      model:      DEFAULT_MODEL.to_owned(),
      dimensions: model_dimensions(DEFAULT_MODEL),
      timeout:    DEFAULT_TIMEOUT,
    }
  }

  pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
    self.base_url = url.into();
    self
  }

  /// Switch model; resets `dimensions` to the model's native width.
  pub fn with_model(mut self, model: impl Into<String>) -> Self {
    self.model = model.into();
    self.dimensions = model_dimensions(&self.model);
    self
  }

  pub fn with_dimensions(mut self, dimensions: usize) -> Self {
    self.dimensions = dimensions;
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }
}

// ─── Embedder ────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiEmbedder {
  client: Client,
  config: OpenAiConfig,
}

impl OpenAiEmbedder {
  pub fn new(config: OpenAiConfig) -> Result<Self> {
    if config.api_key.trim().is_empty() {
      return Err(Error::MissingApiKey);
    }
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
  }

  /// Only ask for a specific width when it differs from the model default;
  /// older models reject the parameter.
  fn requested_dimensions(&self) -> Option<usize> {
    (self.config.dimensions != model_dimensions(&self.config.model))
      .then_some(self.config.dimensions)
  }

  async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
    let body = EmbeddingRequest {
      model: &self.config.model,
      input,
      dimensions: self.requested_dimensions(),
    };

    let resp = self
      .client
      .post(self.url())
      .bearer_auth(&self.config.api_key)
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Api { status: status.as_u16(), body });
    }

    let mut parsed: EmbeddingResponse = resp.json().await?;
    if parsed.data.len() != input.len() {
      return Err(Error::MissingEmbeddings {
        expected: input.len(),
        got:      parsed.data.len(),
      });
    }

    // The API may return items out of order; `index` is authoritative.
    parsed.data.sort_by_key(|d| d.index);
    let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();

    if let Some(bad) = vectors.iter().find(|v| v.len() != self.config.dimensions) {
      return Err(Error::DimensionMismatch {
        expected: self.config.dimensions,
        actual:   bad.len(),
      });
    }

    debug!(model = %self.config.model, count = vectors.len(), "embedded texts");
    Ok(vectors)
  }
}

impl Embedder for OpenAiEmbedder {
  type Error = Error;

  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    let input = [text.to_owned()];
    self
      .request(&input)
      .await?
      .pop()
      .ok_or(Error::MissingEmbeddings { expected: 1, got: 0 })
  }

  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }
    self.request(texts).await
  }

  fn dimensions(&self) -> usize { self.config.dimensions }

  fn model(&self) -> &str { &self.config.model }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
  model:      &'a str,
  input:      &'a [String],
  #[serde(skip_serializing_if = "Option::is_none")]
  dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
  index:     usize,
  embedding: Vec<f32>,
}
