//! The `Embedder` trait: the text-to-vector collaborator.
//!
//! Implementations live in `seek-embed`. The repository never calls an
//! embedder; the service layer embeds first and only then writes.

use std::future::Future;

use crate::Classify;

/// Converts text into a fixed-dimension vector.
///
/// Deterministic per model version. Calls may fail (network, rate limit,
/// rejected input); [`Classify`] tells a provider outage, which is safe to
/// retry, from text the model can never embed.
pub trait Embedder: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  /// Embed a single text.
  fn embed<'a>(
    &'a self,
    text: &'a str,
  ) -> impl Future<Output = Result<Vec<f32>, Self::Error>> + Send + 'a;

  /// Embed several texts, preserving input order.
  ///
  /// The default implementation calls [`Embedder::embed`] sequentially;
  /// providers with a batch endpoint override it.
  fn embed_batch<'a>(
    &'a self,
    texts: &'a [String],
  ) -> impl Future<Output = Result<Vec<Vec<f32>>, Self::Error>> + Send + 'a {
    async move {
      let mut out = Vec::with_capacity(texts.len());
      for text in texts {
        out.push(self.embed(text).await?);
      }
      Ok(out)
    }
  }

  /// Length of every vector this embedder returns.
  fn dimensions(&self) -> usize;

  /// Model identifier, for logging.
  fn model(&self) -> &str;
}
