//! Service error type: the repository and provider failures translated into
//! the caller-facing taxonomy.

use seek_core::{Classify, ErrorKind};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ServiceError {
  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("{0}")]
  AlreadyExists(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[source] BoxError),

  #[error("embedding failed: {0}")]
  EmbeddingFailed(#[source] BoxError),
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

impl ServiceError {
  /// Classify a repository error without losing its message.
  pub fn from_repo<E>(err: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match err.kind() {
      ErrorKind::InvalidInput => Self::InvalidInput(err.to_string()),
      ErrorKind::AlreadyExists => Self::AlreadyExists(err.to_string()),
      ErrorKind::NotFound => Self::NotFound(err.to_string()),
      ErrorKind::ConcurrentUpdateConflict => Self::Conflict(err.to_string()),
      ErrorKind::StorageUnavailable => Self::StorageUnavailable(Box::new(err)),
      ErrorKind::EmbeddingFailed => Self::EmbeddingFailed(Box::new(err)),
    }
  }
}

impl From<seek_core::Error> for ServiceError {
  fn from(err: seek_core::Error) -> Self { Self::from_repo(err) }
}

impl Classify for ServiceError {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::InvalidInput(_) => ErrorKind::InvalidInput,
      Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Conflict(_) => ErrorKind::ConcurrentUpdateConflict,
      Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
      Self::EmbeddingFailed(_) => ErrorKind::EmbeddingFailed,
    }
  }
}
