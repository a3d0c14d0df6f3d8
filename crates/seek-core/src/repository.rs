//! The `KnowledgeRepository` trait.
//!
//! The trait is implemented by storage backends (e.g. `seek-store-sqlite`).
//! The service layer depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  Classify,
  record::{KnowledgeRecord, Metadata, NewKnowledge, ScoredRecord, SimilarityQuery, Upserted},
};

/// Abstraction over a versioned knowledge store.
///
/// For every `service_name` with at least one record, exactly one record is
/// current, `(service_name, version)` is unique, and at most the configured
/// retention depth of versions (always the highest-numbered ones) is kept.
/// Every write either commits with those invariants intact or leaves the
/// store untouched.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait KnowledgeRepository: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  /// The embedding dimension every record must have.
  fn dimensions(&self) -> usize;

  /// The maximum number of versions retained per key.
  fn retention_depth(&self) -> usize;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Write version 1 of a key that has no records yet.
  ///
  /// Fails with an `AlreadyExists` error if any record exists for the key.
  fn insert(
    &self,
    input: NewKnowledge,
  ) -> impl Future<Output = Result<KnowledgeRecord, Self::Error>> + Send + '_;

  /// Create the key at version 1, or supersede its current record with the
  /// next version, then prune history beyond the retention depth, all in
  /// one transaction.
  ///
  /// The version always advances, even when the content is unchanged.
  fn upsert(
    &self,
    input: NewKnowledge,
  ) -> impl Future<Output = Result<Upserted, Self::Error>> + Send + '_;

  /// Replace the metadata of the current record in place.
  fn set_metadata<'a>(
    &'a self,
    service_name: &'a str,
    metadata: Metadata,
  ) -> impl Future<Output = Result<KnowledgeRecord, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The single current record for a key, or `None` if the key is absent.
  fn get_current<'a>(
    &'a self,
    service_name: &'a str,
  ) -> impl Future<Output = Result<Option<KnowledgeRecord>, Self::Error>> + Send + 'a;

  /// Every retained version of a key, newest first.
  fn history<'a>(
    &'a self,
    service_name: &'a str,
  ) -> impl Future<Output = Result<Vec<KnowledgeRecord>, Self::Error>> + Send + 'a;

  /// Rank current records by cosine similarity to `query.embedding`.
  ///
  /// Historical versions are never candidates. Results are ordered by score
  /// descending, ties broken by most recent `updated_at`; the threshold is
  /// applied before truncation to `k`. An empty result is not an error.
  fn similarity_search<'a>(
    &'a self,
    query: &'a SimilarityQuery,
  ) -> impl Future<Output = Result<Vec<ScoredRecord>, Self::Error>> + Send + 'a;
}
