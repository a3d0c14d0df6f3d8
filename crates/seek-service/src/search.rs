//! `search`: semantic lookup over current knowledge.

use chrono::{DateTime, Utc};
use seek_core::{
  embed::Embedder,
  record::{Metadata, ScoredRecord, SimilarityQuery},
  repository::KnowledgeRepository,
  validate,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{KnowledgeService, Result, ServiceError};

pub const DEFAULT_K: usize = 10;

fn default_k() -> usize { DEFAULT_K }

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
  pub query:        String,
  #[serde(default = "default_k")]
  pub k:            usize,
  #[serde(default)]
  pub threshold:    Option<f64>,
  #[serde(default)]
  pub service_name: Option<String>,
}

impl SearchRequest {
  pub fn new(query: impl Into<String>) -> Self {
    Self { query: query.into(), k: DEFAULT_K, threshold: None, service_name: None }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
  pub query:   String,
  pub count:   usize,
  pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
  pub id:           Uuid,
  pub service_name: String,
  pub version:      u32,
  pub content:      String,
  pub metadata:     Metadata,
  /// Cosine similarity rounded to four decimal places.
  pub similarity:   f64,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl From<ScoredRecord> for SearchHit {
  fn from(hit: ScoredRecord) -> Self {
    let r = hit.record;
    Self {
      id:           r.id,
      service_name: r.service_name,
      version:      r.version,
      content:      r.content,
      metadata:     r.metadata,
      similarity:   round4(hit.score),
      created_at:   r.created_at,
      updated_at:   r.updated_at,
    }
  }
}

fn round4(score: f64) -> f64 { (score * 10_000.0).round() / 10_000.0 }

impl<R, E> KnowledgeService<R, E>
where
  R: KnowledgeRepository,
  E: Embedder,
{
  /// Rank current knowledge by similarity to `query`.
  ///
  /// A filter that matches nothing yields an empty response, not an error.
  pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
    let query = req.query.trim();
    if query.is_empty() {
      return Err(ServiceError::InvalidInput("query must not be empty".into()));
    }
    validate::limit(req.k)?;
    validate::threshold(req.threshold)?;
    // A blank filter means no filter.
    let service_name = req
      .service_name
      .as_deref()
      .filter(|s| !s.trim().is_empty())
      .map(validate::service_name)
      .transpose()?
      .map(str::to_owned);

    let embedding = self.embed(query).await?;
    let similarity = SimilarityQuery {
      embedding,
      k: req.k,
      threshold: req.threshold,
      service_name,
    };
    let hits = self
      .repo
      .similarity_search(&similarity)
      .await
      .map_err(ServiceError::from_repo)?;

    debug!(query, k = req.k, hits = hits.len(), "searched knowledge");
    let results: Vec<SearchHit> = hits.into_iter().map(SearchHit::from).collect();
    Ok(SearchResponse {
      query: query.to_owned(),
      count: results.len(),
      results,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::round4;

  #[test]
  fn rounds_to_four_places() {
    assert_eq!(round4(0.123_456), 0.1235);
    assert_eq!(round4(1.0), 1.0);
    assert_eq!(round4(-0.000_04), -0.0);
  }
}
