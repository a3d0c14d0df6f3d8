//! Core types and trait definitions for the Seek knowledge store.
//!
//! Holds the record model, the repository and embedder seams, and the
//! validation rules every layer shares. No HTTP or database code lives here.

// Implementations use `async fn`; the trait signatures spell out `Send`.
#![allow(async_fn_in_trait)]

pub mod embed;
pub mod error;
pub mod record;
pub mod repository;
pub mod validate;
pub mod vector;

pub use error::{Classify, Error, ErrorKind, Result};
