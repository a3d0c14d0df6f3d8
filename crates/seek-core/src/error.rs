//! Error types for `seek-core`, and the error taxonomy shared by every layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("service_name must not be empty")]
  EmptyServiceName,

  #[error("service_name is {len} characters long; the limit is {max}")]
  ServiceNameTooLong { len: usize, max: usize },

  #[error("content must not be empty")]
  EmptyContent,

  #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
  DimensionMismatch { expected: usize, actual: usize },

  #[error("embedding contains {0} non-finite values")]
  NonFiniteEmbedding(usize),

  #[error("k must be at least 1")]
  InvalidLimit,

  #[error("threshold {0} is outside [0, 1]")]
  InvalidThreshold(f64),

  #[error("retention depth must be at least 1")]
  InvalidRetentionDepth,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Taxonomy ────────────────────────────────────────────────────────────────

/// The caller-facing classification of every failure in the system.
///
/// Backends and providers keep their own error enums; they expose the
/// category through [`Classify`] so the service layer can translate without
/// knowing the concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  /// Malformed key, content, query, or embedding. Nothing was written.
  InvalidInput,
  /// `insert` on a key that already has records.
  AlreadyExists,
  /// Read of a key with no record.
  NotFound,
  /// A competing writer held or won the key. Safe to retry.
  ConcurrentUpdateConflict,
  /// Connectivity or transaction failure in the backing store.
  StorageUnavailable,
  /// The embedding provider failed; no write was attempted.
  EmbeddingFailed,
}

impl ErrorKind {
  /// Whether a caller may retry the same request unchanged.
  pub fn is_retryable(self) -> bool {
    matches!(
      self,
      Self::ConcurrentUpdateConflict
        | Self::StorageUnavailable
        | Self::EmbeddingFailed
    )
  }
}

/// Implemented by error types that can be mapped onto [`ErrorKind`].
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Serialization(_) => ErrorKind::StorageUnavailable,
      _ => ErrorKind::InvalidInput,
    }
  }
}
