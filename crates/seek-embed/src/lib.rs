//! Embedding providers for Seek.
//!
//! - [`OpenAiEmbedder`]: any OpenAI-compatible `/embeddings` endpoint.
//! - [`HashEmbedder`]: deterministic feature hashing; offline and in tests.
//! - [`Provider`]: one of the above, chosen at runtime from
//!   [`ProviderConfig`].

mod hash;
mod openai;
mod provider;

pub mod error;

pub use error::{Error, Result};
pub use hash::HashEmbedder;
pub use openai::{OpenAiConfig, OpenAiEmbedder};
pub use provider::{Provider, ProviderConfig, ProviderKind};
