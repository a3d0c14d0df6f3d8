//! Service-level tests over an in-memory SQLite store and the hashing
//! embedder.

use std::sync::{
  Arc,
  atomic::{AtomicUsize, Ordering},
};

use seek_core::{Classify, ErrorKind, embed::Embedder, record::VersionState};
use seek_embed::HashEmbedder;
use seek_store_sqlite::{SqliteStore, StoreConfig};
use serde_json::json;

use crate::{
  KnowledgeService, ServiceError, ingest::IngestRequest, search::SearchRequest,
  update::UpdateRequest,
};

const DIMS: usize = 64;

async fn store() -> Arc<SqliteStore> {
  Arc::new(
    SqliteStore::open_in_memory(StoreConfig::new(DIMS))
      .await
      .expect("in-memory store"),
  )
}

async fn service() -> KnowledgeService<SqliteStore, HashEmbedder> {
  KnowledgeService::new(store().await, Arc::new(HashEmbedder::new(DIMS))).unwrap()
}

fn ingest(name: &str, content: &str) -> IngestRequest {
  IngestRequest {
    service_name: name.to_owned(),
    content:      content.to_owned(),
    metadata:     None,
  }
}

fn update(name: &str, content: &str) -> UpdateRequest {
  UpdateRequest {
    service_name: name.to_owned(),
    content:      content.to_owned(),
    metadata:     None,
  }
}

// ─── Test embedders ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("provider unavailable")]
struct ProviderDown;

impl Classify for ProviderDown {
  fn kind(&self) -> ErrorKind { ErrorKind::EmbeddingFailed }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
  type Error = ProviderDown;

  async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderDown> { Err(ProviderDown) }

  fn dimensions(&self) -> usize { DIMS }

  fn model(&self) -> &str { "failing" }
}

/// Counts calls and delegates to the hashing embedder.
#[derive(Default)]
struct CountingEmbedder {
  inner: HashEmbedder,
  calls: AtomicUsize,
}

impl Embedder for CountingEmbedder {
  type Error = seek_embed::Error;

  async fn embed(&self, text: &str) -> Result<Vec<f32>, seek_embed::Error> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.inner.embed(text).await
  }

  fn dimensions(&self) -> usize { self.inner.dimensions() }

  fn model(&self) -> &str { "counting" }
}

// ─── Construction ────────────────────────────────────────────────────────────

#[tokio::test]
async fn mismatched_embedder_rejected() {
  let err = KnowledgeService::new(store().await, Arc::new(HashEmbedder::new(DIMS + 1)))
    .err()
    .unwrap();
  assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ─── Ingest ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_then_duplicate_is_already_exists() {
  let svc = service().await;

  let first = svc.ingest(ingest("svc1", "content-v1")).await.unwrap();
  assert_eq!(first.version, 1);
  assert_eq!(first.service_name, "svc1");

  let current = svc.current("svc1").await.unwrap();
  assert_eq!(current.id, first.id);
  assert_eq!(current.version, 1);
  assert_eq!(current.state, VersionState::Current);

  let err = svc.ingest(ingest("svc1", "content-v2")).await.unwrap_err();
  assert!(matches!(err, ServiceError::AlreadyExists(_)));
  assert!(err.to_string().contains("update"));

  assert_eq!(svc.current("svc1").await.unwrap().content, "content-v1");
}

#[tokio::test]
async fn ingest_duplicate_skips_embedding() {
  let embedder = Arc::new(CountingEmbedder::default());
  let svc = KnowledgeService::new(
    Arc::new(
      SqliteStore::open_in_memory(StoreConfig::new(embedder.dimensions()))
        .await
        .unwrap(),
    ),
    embedder.clone(),
  )
  .unwrap();

  svc.ingest(ingest("svc1", "first")).await.unwrap();
  assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);

  svc.ingest(ingest("svc1", "second")).await.unwrap_err();
  assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ingest_trims_service_name() {
  let svc = service().await;
  let resp = svc.ingest(ingest("  billing  ", "charges")).await.unwrap();
  assert_eq!(resp.service_name, "billing");
  assert!(svc.current("billing").await.is_ok());
}

#[tokio::test]
async fn invalid_input_rejected_before_write() {
  let embedder = Arc::new(CountingEmbedder::default());
  let svc = KnowledgeService::new(
    Arc::new(
      SqliteStore::open_in_memory(StoreConfig::new(embedder.dimensions()))
        .await
        .unwrap(),
    ),
    embedder.clone(),
  )
  .unwrap();

  for req in [
    ingest("   ", "content"),
    ingest("svc", "  \n"),
    ingest(&"x".repeat(256), "content"),
  ] {
    let err = svc.ingest(req).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
  }
  let err = svc
    .update(UpdateRequest { metadata: Some(json!(["not", "an", "object"])), ..update("svc", "c") })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidInput);

  assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
  assert_eq!(svc.history("svc").await.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn embedding_failure_aborts_write() {
  let svc = KnowledgeService::new(store().await, Arc::new(FailingEmbedder)).unwrap();

  let err = svc.ingest(ingest("svc1", "content")).await.unwrap_err();
  assert!(matches!(err, ServiceError::EmbeddingFailed(_)));
  assert!(err.kind().is_retryable());

  let err = svc.update(update("svc1", "content")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::EmbeddingFailed);

  let err = svc.current("svc1").await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn unembeddable_content_is_invalid_input() {
  let svc = service().await;

  let err = svc.update(update("svc1", "?!... --- ***")).await.unwrap_err();
  assert!(matches!(err, ServiceError::InvalidInput(_)));
  assert!(!err.kind().is_retryable());

  let err = svc.ingest(ingest("svc1", "!!!")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidInput);

  assert_eq!(svc.current("svc1").await.unwrap_err().kind(), ErrorKind::NotFound);
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_creates_then_supersedes() {
  let svc = service().await;

  let v1 = svc.update(update("svc1", "content-v1")).await.unwrap();
  assert_eq!(v1.version, 1);
  assert!(v1.created);

  let v2 = svc.update(update("svc1", "content-v2")).await.unwrap();
  assert_eq!(v2.version, 2);
  assert!(!v2.created);
  assert_ne!(v1.id, v2.id);

  let history = svc.history("svc1").await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].version, 2);
  assert_eq!(history[0].state, VersionState::Current);
  assert_eq!(history[1].version, 1);
  assert_eq!(history[1].state, VersionState::Historical);
}

#[tokio::test]
async fn identical_update_still_advances_version() {
  let svc = service().await;
  svc.update(update("svc1", "same")).await.unwrap();
  let second = svc.update(update("svc1", "same")).await.unwrap();
  assert_eq!(second.version, 2);
  assert_eq!(svc.history("svc1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn six_updates_keep_last_five() {
  let svc = service().await;
  for i in 1..=6 {
    svc
      .update(update("svcA", &format!("revision {i}")))
      .await
      .unwrap();
  }

  let versions: Vec<u32> = svc
    .history("svcA")
    .await
    .unwrap()
    .iter()
    .map(|r| r.version)
    .collect();
  assert_eq!(versions, vec![6, 5, 4, 3, 2]);
}

#[tokio::test]
async fn concurrent_updates_never_share_a_version() {
  let svc = service().await;
  svc.update(update("svcB", "base")).await.unwrap();

  let (a, b) = tokio::join!(
    svc.update(update("svcB", "writer a")),
    svc.update(update("svcB", "writer b")),
  );

  let mut versions = Vec::new();
  for result in [a, b] {
    match result {
      Ok(resp) => versions.push(resp.version),
      Err(e) => assert_eq!(e.kind(), ErrorKind::ConcurrentUpdateConflict),
    }
  }
  assert!(!versions.is_empty());
  versions.sort_unstable();
  versions.dedup();
  assert!(versions.iter().all(|v| *v == 2 || *v == 3));

  let history = svc.history("svcB").await.unwrap();
  assert_eq!(
    history.iter().filter(|r| r.state == VersionState::Current).count(),
    1
  );
}

#[tokio::test]
async fn metadata_is_stored_as_given() {
  let svc = service().await;
  let meta = json!({ "owner": "payments", "tags": ["billing", "v2"] });
  svc
    .update(UpdateRequest { metadata: Some(meta.clone()), ..update("svc1", "content") })
    .await
    .unwrap();

  let current = svc.current("svc1").await.unwrap();
  assert_eq!(serde_json::Value::Object(current.metadata), meta);
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_ranks_current_knowledge() {
  let svc = service().await;
  svc
    .ingest(ingest("payments", "create a payment charge refund invoice"))
    .await
    .unwrap();
  svc
    .ingest(ingest("users", "register user account password login"))
    .await
    .unwrap();

  let resp = svc
    .search(SearchRequest::new("refund a payment charge"))
    .await
    .unwrap();
  assert_eq!(resp.query, "refund a payment charge");
  assert_eq!(resp.count, resp.results.len());
  assert_eq!(resp.results[0].service_name, "payments");
  assert!(resp.results[0].similarity >= resp.results[resp.count - 1].similarity);
}

#[tokio::test]
async fn search_ignores_superseded_versions() {
  let svc = service().await;
  svc.update(update("svc1", "alpha bravo charlie")).await.unwrap();
  svc.update(update("svc1", "delta echo foxtrot")).await.unwrap();

  let resp = svc
    .search(SearchRequest::new("alpha bravo charlie"))
    .await
    .unwrap();
  assert_eq!(resp.count, 1);
  assert_eq!(resp.results[0].version, 2);
  assert_eq!(resp.results[0].content, "delta echo foxtrot");
}

#[tokio::test]
async fn search_unknown_service_is_empty() {
  let svc = service().await;
  svc.ingest(ingest("svc1", "some content")).await.unwrap();

  let resp = svc
    .search(SearchRequest {
      k: 5,
      service_name: Some("svcX".into()),
      ..SearchRequest::new("query")
    })
    .await
    .unwrap();
  assert_eq!(resp.count, 0);
  assert!(resp.results.is_empty());
}

#[tokio::test]
async fn blank_service_filter_searches_everything() {
  let svc = service().await;
  svc.update(update("svc1", "alpha bravo")).await.unwrap();
  svc.update(update("svc2", "charlie delta")).await.unwrap();

  for blank in ["", "   "] {
    let resp = svc
      .search(SearchRequest {
        service_name: Some(blank.into()),
        ..SearchRequest::new("alpha")
      })
      .await
      .unwrap();
    assert_eq!(resp.count, 2);
  }
}

#[tokio::test]
async fn search_threshold_and_limit() {
  let svc = service().await;
  svc.ingest(ingest("a", "apple banana cherry")).await.unwrap();
  svc.ingest(ingest("b", "apple mango papaya")).await.unwrap();
  svc.ingest(ingest("c", "zebra yak walrus")).await.unwrap();

  let one = svc
    .search(SearchRequest { k: 1, ..SearchRequest::new("apple banana cherry") })
    .await
    .unwrap();
  assert_eq!(one.count, 1);
  assert_eq!(one.results[0].service_name, "a");
  assert_eq!(one.results[0].similarity, 1.0);

  let exact = svc
    .search(SearchRequest { threshold: Some(0.999), ..SearchRequest::new("apple banana cherry") })
    .await
    .unwrap();
  assert_eq!(exact.count, 1);
  assert!(exact.results.iter().all(|h| h.similarity >= 0.999));
}

#[tokio::test]
async fn search_validation() {
  let svc = service().await;

  let err = svc.search(SearchRequest::new("   ")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidInput);

  let err = svc
    .search(SearchRequest { k: 0, ..SearchRequest::new("q") })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::InvalidInput);

  for t in [-0.1, 1.5, f64::NAN] {
    let err = svc
      .search(SearchRequest { threshold: Some(t), ..SearchRequest::new("q") })
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
  }
}

#[test]
fn search_request_defaults() {
  let req: SearchRequest = serde_json::from_value(json!({ "query": "hi" })).unwrap();
  assert_eq!(req.k, 10);
  assert!(req.threshold.is_none());
  assert!(req.service_name.is_none());
}
