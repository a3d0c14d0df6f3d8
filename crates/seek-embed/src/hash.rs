//! Deterministic feature-hashing embedder.
//!
//! Each lowercase alphanumeric token is hashed to a bucket and a sign; the
//! bucket counts form the vector, which is then scaled to unit length. Texts
//! sharing vocabulary score close together, so search behaves sensibly
//! without a network model.

use seek_core::{embed::Embedder, vector::normalize};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

pub const DEFAULT_DIMENSIONS: usize = 384;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
  dimensions: usize,
}

impl HashEmbedder {
  pub fn new(dimensions: usize) -> Self { Self { dimensions: dimensions.max(1) } }

  fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text
      .split(|c: char| !c.is_alphanumeric())
      .filter(|t| !t.is_empty())
      .map(str::to_lowercase)
  }

  fn embed_sync(&self, text: &str) -> Result<Vec<f32>> {
    let mut v = vec![0.0f32; self.dimensions];
    let mut seen = false;

    for token in Self::tokens(text) {
      let digest = Sha256::digest(token.as_bytes());
      let mut bucket = [0u8; 8];
      bucket.copy_from_slice(&digest[..8]);
      let idx = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
      v[idx] += if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
      seen = true;
    }

    if !seen {
      return Err(Error::EmptyInput);
    }
    normalize(&mut v);
    Ok(v)
  }
}

impl Default for HashEmbedder {
  fn default() -> Self { Self::new(DEFAULT_DIMENSIONS) }
}

impl Embedder for HashEmbedder {
  type Error = Error;

  async fn embed(&self, text: &str) -> Result<Vec<f32>> { self.embed_sync(text) }

  fn dimensions(&self) -> usize { self.dimensions }

  fn model(&self) -> &str { "feature-hash" }
}

#[cfg(test)]
mod tests {
  use seek_core::{Classify, ErrorKind, vector::cosine_similarity};

  use super::*;

  #[tokio::test]
  async fn deterministic() {
    let e = HashEmbedder::new(64);
    let a = e.embed("Payments API: create a charge").await.unwrap();
    let b = e.embed("Payments API: create a charge").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
  }

  #[tokio::test]
  async fn unit_length() {
    let e = HashEmbedder::new(32);
    let v = e.embed("some words here").await.unwrap();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-5);
  }

  #[tokio::test]
  async fn case_and_punctuation_insensitive() {
    let e = HashEmbedder::default();
    let a = e.embed("Refund, ORDER!").await.unwrap();
    let b = e.embed("refund order").await.unwrap();
    assert_eq!(a, b);
  }

  #[tokio::test]
  async fn shared_vocabulary_scores_higher() {
    let e = HashEmbedder::default();
    let q = e.embed("refund an order").await.unwrap();
    let near = e.embed("how to refund a customer order").await.unwrap();
    let far = e.embed("kubernetes liveness probe timeout").await.unwrap();
    assert!(cosine_similarity(&q, &near) > cosine_similarity(&q, &far));
  }

  #[tokio::test]
  async fn punctuation_only_is_empty_input() {
    let e = HashEmbedder::default();
    let err = e.embed("?!...").await.unwrap_err();
    assert!(matches!(err, Error::EmptyInput));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
  }

  #[tokio::test]
  async fn batch_preserves_order() {
    let e = HashEmbedder::new(16);
    let texts = vec!["alpha".to_owned(), "beta".to_owned()];
    let out = e.embed_batch(&texts).await.unwrap();
    assert_eq!(out[0], e.embed("alpha").await.unwrap());
    assert_eq!(out[1], e.embed("beta").await.unwrap());
  }
}
