//! Error type for `seek-embed`.

use seek_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("embedding API returned {status}: {body}")]
  Api { status: u16, body: String },

  #[error("embedding API returned {got} vectors for {expected} inputs")]
  MissingEmbeddings { expected: usize, got: usize },

  #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
  DimensionMismatch { expected: usize, actual: usize },

  #[error("no API key configured for the embedding provider")]
  MissingApiKey,

  #[error("text has nothing to embed")]
  EmptyInput,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      // Retrying the same text cannot help.
      Error::EmptyInput => ErrorKind::InvalidInput,
      Error::Http(_)
      | Error::Api { .. }
      | Error::MissingEmbeddings { .. }
      | Error::DimensionMismatch { .. }
      | Error::MissingApiKey => ErrorKind::EmbeddingFailed,
    }
  }
}
