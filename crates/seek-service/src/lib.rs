//! Knowledge services for Seek.
//!
//! [`KnowledgeService`] composes an [`Embedder`] with any
//! [`KnowledgeRepository`]: it validates requests, embeds text, delegates to
//! the repository and shapes the results. Transport concerns are the
//! caller's responsibility.

pub mod error;
pub mod ingest;
pub mod records;
pub mod search;
pub mod update;

use std::sync::Arc;

use seek_core::{
  Classify, ErrorKind, embed::Embedder, record::Metadata, repository::KnowledgeRepository,
};
use serde_json::Value;
use tracing::warn;

pub use error::{Result, ServiceError};

/// Orchestrates embedding and storage for the three knowledge operations.
///
/// Cheap to clone; both collaborators are reference-counted.
pub struct KnowledgeService<R, E> {
  repo:     Arc<R>,
  embedder: Arc<E>,
}

impl<R, E> Clone for KnowledgeService<R, E> {
  fn clone(&self) -> Self {
    Self { repo: self.repo.clone(), embedder: self.embedder.clone() }
  }
}

impl<R, E> KnowledgeService<R, E>
where
  R: KnowledgeRepository,
  E: Embedder,
{
  /// Fails when the embedder's vectors would not fit the repository.
  pub fn new(repo: Arc<R>, embedder: Arc<E>) -> Result<Self> {
    if embedder.dimensions() != repo.dimensions() {
      return Err(ServiceError::InvalidInput(format!(
        "embedder {:?} produces {}-dimensional vectors but the store expects {}",
        embedder.model(),
        embedder.dimensions(),
        repo.dimensions()
      )));
    }
    Ok(Self { repo, embedder })
  }

  pub fn repository(&self) -> &R { &self.repo }

  pub fn embedder(&self) -> &E { &self.embedder }

  /// Embed `text`. Text the provider rejects as unembeddable is
  /// `InvalidInput`; every other failure is `EmbeddingFailed`.
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    self.embedder.embed(text).await.map_err(|e| {
      warn!(model = self.embedder.model(), error = %e, "embedding failed");
      match e.kind() {
        ErrorKind::InvalidInput => ServiceError::InvalidInput(e.to_string()),
        _ => ServiceError::EmbeddingFailed(Box::new(e)),
      }
    })
  }
}

/// Accept absent or `null` metadata as empty; anything but an object is
/// rejected.
pub(crate) fn parse_metadata(value: Option<Value>) -> Result<Metadata> {
  match value {
    None | Some(Value::Null) => Ok(Metadata::new()),
    Some(Value::Object(map)) => Ok(map),
    Some(other) => Err(ServiceError::InvalidInput(format!(
      "metadata must be a JSON object, got {}",
      json_type(&other)
    ))),
  }
}

fn json_type(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

#[cfg(test)]
mod tests;
