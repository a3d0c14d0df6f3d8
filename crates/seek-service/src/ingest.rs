//! `ingest`: create the knowledge for a new `service_name`.

use seek_core::{
  embed::Embedder, record::NewKnowledge, repository::KnowledgeRepository, validate,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{KnowledgeService, Result, ServiceError, parse_metadata};

#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
  pub service_name: String,
  pub content:      String,
  #[serde(default)]
  pub metadata:     Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
  pub id:           Uuid,
  pub service_name: String,
  pub version:      u32,
  pub message:      String,
}

impl<R, E> KnowledgeService<R, E>
where
  R: KnowledgeRepository,
  E: Embedder,
{
  /// Store version 1 of a key that does not exist yet.
  ///
  /// Fails with `AlreadyExists` when the key has any record; callers wanting
  /// create-or-replace use [`update`](Self::update).
  pub async fn ingest(&self, req: IngestRequest) -> Result<IngestResponse> {
    let service_name = validate::service_name(&req.service_name)?.to_owned();
    validate::content(&req.content)?;
    let metadata = parse_metadata(req.metadata)?;

    // Checked again atomically by `insert`; this just avoids paying for an
    // embedding that would be thrown away.
    let existing = self
      .repo
      .get_current(&service_name)
      .await
      .map_err(ServiceError::from_repo)?;
    if existing.is_some() {
      return Err(ServiceError::AlreadyExists(format!(
        "knowledge for service '{service_name}' already exists; use update to replace it"
      )));
    }

    let embedding = self.embed(&req.content).await?;
    let record = self
      .repo
      .insert(NewKnowledge {
        service_name: service_name.clone(),
        content: req.content,
        embedding,
        metadata,
      })
      .await
      .map_err(ServiceError::from_repo)?;

    info!(service_name = %record.service_name, id = %record.id, "ingested knowledge");
    Ok(IngestResponse {
      id:           record.id,
      message:      format!("knowledge ingested for service '{}'", record.service_name),
      service_name: record.service_name,
      version:      record.version,
    })
  }
}
