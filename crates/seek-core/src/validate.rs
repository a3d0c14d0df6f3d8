//! Input validation shared by the repository and the service layer.

use crate::{Error, Result};

/// Longest accepted `service_name`, in characters.
pub const MAX_SERVICE_NAME_LEN: usize = 255;

/// Trim `name` and check it is a usable key. Returns the trimmed key.
pub fn service_name(name: &str) -> Result<&str> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyServiceName);
  }
  let len = trimmed.chars().count();
  if len > MAX_SERVICE_NAME_LEN {
    return Err(Error::ServiceNameTooLong { len, max: MAX_SERVICE_NAME_LEN });
  }
  Ok(trimmed)
}

pub fn content(text: &str) -> Result<()> {
  if text.trim().is_empty() {
    return Err(Error::EmptyContent);
  }
  Ok(())
}

/// Check an embedding has the system-wide dimension and only finite values.
pub fn embedding(embedding: &[f32], expected: usize) -> Result<()> {
  if embedding.len() != expected {
    return Err(Error::DimensionMismatch {
      expected,
      actual: embedding.len(),
    });
  }
  let bad = embedding.iter().filter(|v| !v.is_finite()).count();
  if bad > 0 {
    return Err(Error::NonFiniteEmbedding(bad));
  }
  Ok(())
}

pub fn limit(k: usize) -> Result<()> {
  if k == 0 {
    return Err(Error::InvalidLimit);
  }
  Ok(())
}

pub fn threshold(threshold: Option<f64>) -> Result<()> {
  match threshold {
    Some(t) if !(0.0..=1.0).contains(&t) => Err(Error::InvalidThreshold(t)),
    _ => Ok(()),
  }
}
