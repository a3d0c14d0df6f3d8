//! Error type for `seek-store-sqlite`.

use seek_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] seek_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("corrupt row: {0}")]
  Decode(String),

  #[error("knowledge for service '{0}' already exists")]
  AlreadyExists(String),

  #[error("no knowledge for service '{0}'")]
  NotFound(String),

  /// Another writer held the database lock, or won a uniqueness race.
  #[error("concurrent update to service '{0}'; retry with a fresh read")]
  Conflict(String),

  #[error(
    "database was created for {stored}-dimensional embeddings, but {configured} were configured"
  )]
  DimensionConflict { configured: usize, stored: usize },

  #[error("database schema version {found} is newer than the supported {supported}")]
  UnsupportedSchema { found: i64, supported: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
      Error::NotFound(_) => ErrorKind::NotFound,
      Error::Conflict(_) => ErrorKind::ConcurrentUpdateConflict,
      Error::Database(_)
      | Error::Json(_)
      | Error::Uuid(_)
      | Error::Decode(_)
      | Error::DimensionConflict { .. }
      | Error::UnsupportedSchema { .. } => ErrorKind::StorageUnavailable,
    }
  }
}

/// The SQLite result code behind a driver error, if there is one.
pub(crate) fn sqlite_code(err: &tokio_rusqlite::Error) -> Option<rusqlite::ErrorCode> {
  match err {
    tokio_rusqlite::Error::Rusqlite(e) => e.sqlite_error_code(),
    _ => None,
  }
}
