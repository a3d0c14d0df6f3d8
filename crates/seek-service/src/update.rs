//! `update`: create-or-replace the knowledge for a `service_name`.

use seek_core::{
  embed::Embedder, record::NewKnowledge, repository::KnowledgeRepository, validate,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{KnowledgeService, Result, ServiceError, parse_metadata};

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
  pub service_name: String,
  pub content:      String,
  #[serde(default)]
  pub metadata:     Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateResponse {
  pub id:           Uuid,
  pub service_name: String,
  pub version:      u32,
  /// `true` when the key was new; `false` when an existing version was
  /// superseded.
  pub created:      bool,
  pub message:      String,
}

impl<R, E> KnowledgeService<R, E>
where
  R: KnowledgeRepository,
  E: Embedder,
{
  /// Write a new current version, creating the key if needed.
  ///
  /// Every call advances the version, even when `content` is unchanged.
  pub async fn update(&self, req: UpdateRequest) -> Result<UpdateResponse> {
    let service_name = validate::service_name(&req.service_name)?.to_owned();
    validate::content(&req.content)?;
    let metadata = parse_metadata(req.metadata)?;

    let embedding = self.embed(&req.content).await?;
    let upserted = self
      .repo
      .upsert(NewKnowledge {
        service_name,
        content: req.content,
        embedding,
        metadata,
      })
      .await
      .map_err(ServiceError::from_repo)?;

    let record = upserted.record;
    let action = if upserted.created { "created" } else { "updated" };
    info!(
      service_name = %record.service_name,
      version = record.version,
      action,
      "updated knowledge"
    );

    Ok(UpdateResponse {
      id:           record.id,
      message:      format!(
        "knowledge {action} for service '{}' (version {})",
        record.service_name, record.version
      ),
      service_name: record.service_name,
      version:      record.version,
      created:      upserted.created,
    })
  }
}
