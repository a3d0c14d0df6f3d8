//! Knowledge records, the unit of storage.
//!
//! A record is one version of the knowledge held for a `service_name`. Its
//! content and embedding are written once; a later update creates a new
//! version and demotes the previous one to history rather than mutating it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Open, schema-less metadata attached to a record. Opaque to the store.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ─── Record ──────────────────────────────────────────────────────────────────

/// A stored version of the knowledge for one `service_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
  /// Store-assigned; unique across all versions of all keys.
  pub id:           Uuid,
  pub service_name: String,
  /// Starts at 1 and increases by one with every write to the key.
  pub version:      u32,
  pub content:      String,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub embedding:    Vec<f32>,
  pub metadata:     Metadata,
  /// Exactly one record per key carries `true`.
  pub is_current:   bool,
  pub created_at:   DateTime<Utc>,
  /// Moves when the record loses currency or its metadata is replaced.
  pub updated_at:   DateTime<Utc>,
}

impl KnowledgeRecord {
  /// The lifecycle state of this version.
  pub fn state(&self) -> VersionState {
    if self.is_current {
      VersionState::Current
    } else {
      VersionState::Historical
    }
  }
}

/// Where a retained version sits in its key's lifecycle. Purged versions are
/// gone from the store and so never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionState {
  Current,
  Historical,
}

// ─── NewKnowledge ────────────────────────────────────────────────────────────

/// Input to [`crate::repository::KnowledgeRepository::insert`] and
/// [`upsert`](crate::repository::KnowledgeRepository::upsert).
/// `id`, `version`, currency and timestamps are always set by the store.
#[derive(Debug, Clone)]
pub struct NewKnowledge {
  pub service_name: String,
  pub content:      String,
  pub embedding:    Vec<f32>,
  pub metadata:     Metadata,
}

impl NewKnowledge {
  /// Convenience constructor with empty metadata.
  pub fn new(
    service_name: impl Into<String>,
    content: impl Into<String>,
    embedding: Vec<f32>,
  ) -> Self {
    Self {
      service_name: service_name.into(),
      content: content.into(),
      embedding,
      metadata: Metadata::new(),
    }
  }

  pub fn with_metadata(mut self, metadata: Metadata) -> Self {
    self.metadata = metadata;
    self
  }
}

/// Result of an upsert: the new current record and whether the key was new.
#[derive(Debug, Clone)]
pub struct Upserted {
  pub record:  KnowledgeRecord,
  /// `true` when the key had no records and version 1 was written.
  pub created: bool,
}

// ─── Similarity search ───────────────────────────────────────────────────────

/// Parameters for [`crate::repository::KnowledgeRepository::similarity_search`].
#[derive(Debug, Clone)]
pub struct SimilarityQuery {
  pub embedding:    Vec<f32>,
  /// Maximum number of results; must be at least 1.
  pub k:            usize,
  /// Minimum score, applied before truncation to `k`.
  pub threshold:    Option<f64>,
  /// Restrict the candidates to this key's current record.
  pub service_name: Option<String>,
}

impl SimilarityQuery {
  pub fn new(embedding: Vec<f32>, k: usize) -> Self {
    Self { embedding, k, threshold: None, service_name: None }
  }
}

/// A current record paired with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
  pub record: KnowledgeRecord,
  pub score:  f64,
}
