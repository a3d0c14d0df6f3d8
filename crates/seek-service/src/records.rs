//! Read access to stored knowledge, without embeddings.

use chrono::{DateTime, Utc};
use seek_core::{
  embed::Embedder,
  record::{KnowledgeRecord, Metadata, VersionState},
  repository::KnowledgeRepository,
  validate,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{KnowledgeService, Result, ServiceError};

/// A stored version as callers see it.
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
  pub id:           Uuid,
  pub service_name: String,
  pub version:      u32,
  pub state:        VersionState,
  pub content:      String,
  pub metadata:     Metadata,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl From<KnowledgeRecord> for RecordView {
  fn from(r: KnowledgeRecord) -> Self {
    Self {
      state:        r.state(),
      id:           r.id,
      service_name: r.service_name,
      version:      r.version,
      content:      r.content,
      metadata:     r.metadata,
      created_at:   r.created_at,
      updated_at:   r.updated_at,
    }
  }
}

impl<R, E> KnowledgeService<R, E>
where
  R: KnowledgeRepository,
  E: Embedder,
{
  /// The current version of a key. `NotFound` when the key is absent.
  pub async fn current(&self, service_name: &str) -> Result<RecordView> {
    let name = validate::service_name(service_name)?;
    self
      .repo
      .get_current(name)
      .await
      .map_err(ServiceError::from_repo)?
      .map(RecordView::from)
      .ok_or_else(|| not_found(name))
  }

  /// Every retained version of a key, newest first. `NotFound` when the key
  /// is absent.
  pub async fn history(&self, service_name: &str) -> Result<Vec<RecordView>> {
    let name = validate::service_name(service_name)?;
    let versions = self
      .repo
      .history(name)
      .await
      .map_err(ServiceError::from_repo)?;
    if versions.is_empty() {
      return Err(not_found(name));
    }
    Ok(versions.into_iter().map(RecordView::from).collect())
  }
}

fn not_found(name: &str) -> ServiceError {
  ServiceError::NotFound(format!("no knowledge stored for service '{name}'"))
}
