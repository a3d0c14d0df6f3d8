//! [`SqliteStore`]: the SQLite implementation of [`KnowledgeRepository`].

use std::{path::Path, time::Duration};

use rusqlite::{ErrorCode, OptionalExtension as _, TransactionBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use seek_core::{
  record::{KnowledgeRecord, Metadata, NewKnowledge, ScoredRecord, SimilarityQuery, Upserted},
  repository::KnowledgeRepository,
  validate,
};

use crate::{
  Error, Result,
  encode::{
    EncodedRecord, RECORD_COLUMNS, RawRecord, encode_dt, encode_embedding, encode_metadata, now,
  },
  error::sqlite_code,
  schema::{SCHEMA, SCHEMA_VERSION, register_functions},
};

/// Number of versions kept per key unless configured otherwise.
pub const DEFAULT_RETENTION_DEPTH: usize = 5;

/// How long a writer waits for another connection's lock before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Config ──────────────────────────────────────────────────────────────────

/// Store-wide settings fixed at open time.
#[derive(Debug, Clone)]
pub struct StoreConfig {
  /// Embedding dimension every record must have.
  pub dimensions:      usize,
  /// Maximum versions retained per key; at least 1.
  pub retention_depth: usize,
  pub busy_timeout:    Duration,
}

impl StoreConfig {
  pub fn new(dimensions: usize) -> Self {
    Self {
      dimensions,
      retention_depth: DEFAULT_RETENTION_DEPTH,
      busy_timeout: DEFAULT_BUSY_TIMEOUT,
    }
  }

  pub fn with_retention_depth(mut self, depth: usize) -> Self {
    self.retention_depth = depth;
    self
  }

  pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
    self.busy_timeout = timeout;
    self
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Seek knowledge store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Several
/// stores (in this or other processes) may share one file; writes serialise
/// on SQLite's database lock.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  config: StoreConfig,
}

/// What an upsert transaction did, reported back from the connection thread.
struct UpsertOutcome {
  version:    i64,
  created:    bool,
  superseded: Option<String>,
  pruned:     usize,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, config).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory(config: StoreConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, config).await
  }

  async fn init(conn: tokio_rusqlite::Connection, config: StoreConfig) -> Result<Self> {
    if config.retention_depth == 0 {
      return Err(seek_core::Error::InvalidRetentionDepth.into());
    }

    let dims_str = config.dimensions.to_string();
    let busy = config.busy_timeout;
    let stored: Result<String, i64> = conn
      .call(move |conn| {
        conn.busy_timeout(busy)?;
        let found: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        if found > SCHEMA_VERSION {
          return Ok(Err(found));
        }
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        conn.execute(
          "INSERT OR IGNORE INTO store_meta (key, value) VALUES ('dimensions', ?1)",
          rusqlite::params![dims_str],
        )?;
        Ok(Ok(conn.query_row(
          "SELECT value FROM store_meta WHERE key = 'dimensions'",
          [],
          |r| r.get(0),
        )?))
      })
      .await?;
    let stored = stored.map_err(|found| Error::UnsupportedSchema {
      found,
      supported: SCHEMA_VERSION,
    })?;

    let stored: usize = stored
      .parse()
      .map_err(|_| Error::Decode(format!("stored dimension {stored:?}")))?;
    if stored != config.dimensions {
      return Err(Error::DimensionConflict { configured: config.dimensions, stored });
    }

    debug!(
      dimensions = config.dimensions,
      retention_depth = config.retention_depth,
      "knowledge store ready"
    );
    Ok(Self { conn, config })
  }

  pub fn config(&self) -> &StoreConfig { &self.config }

  /// Validate `input` and build the record it would become, minus the
  /// version, which is only known inside the write transaction.
  fn prepare(&self, input: NewKnowledge) -> Result<KnowledgeRecord> {
    let service_name = validate::service_name(&input.service_name)?.to_owned();
    validate::content(&input.content)?;
    validate::embedding(&input.embedding, self.config.dimensions)?;

    let at = now();
    Ok(KnowledgeRecord {
      id: Uuid::new_v4(),
      service_name,
      version: 1,
      content: input.content,
      embedding: input.embedding,
      metadata: input.metadata,
      is_current: true,
      created_at: at,
      updated_at: at,
    })
  }

  /// Number of stored versions for a key, current included.
  pub async fn count_versions(&self, service_name: &str) -> Result<usize> {
    let key = service_name.trim().to_owned();
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM knowledge WHERE service_name = ?1",
          rusqlite::params![key],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count as usize)
  }

  async fn query_records(
    &self,
    sql: &'static str,
    service_name: &str,
  ) -> Result<Vec<KnowledgeRecord>> {
    let key = service_name.trim().to_owned();
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params![key], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

/// Translate a failed write transaction into the caller-facing error.
///
/// Lock timeouts are conflicts: a competing writer held the key. Constraint
/// violations mean that writer committed first; `on_constraint` decides what
/// that means for the operation.
pub(crate) fn write_error(
  err: tokio_rusqlite::Error,
  service_name: &str,
  on_constraint: fn(String) -> Error,
) -> Error {
  match sqlite_code(&err) {
    Some(ErrorCode::ConstraintViolation) => {
      warn!(service_name, error = %err, "write rejected by uniqueness constraint");
      on_constraint(service_name.to_owned())
    }
    Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
      warn!(service_name, error = %err, "write lock not acquired");
      Error::Conflict(service_name.to_owned())
    }
    _ => Error::Database(err),
  }
}

// ─── KnowledgeRepository impl ────────────────────────────────────────────────

impl KnowledgeRepository for SqliteStore {
  type Error = Error;

  fn dimensions(&self) -> usize { self.config.dimensions }

  fn retention_depth(&self) -> usize { self.config.retention_depth }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert(&self, input: NewKnowledge) -> Result<KnowledgeRecord> {
    let record = self.prepare(input)?;
    let row = EncodedRecord::from_record(&record)?;

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists = tx
          .query_row(
            "SELECT 1 FROM knowledge WHERE service_name = ?1 LIMIT 1",
            rusqlite::params![row.service_name],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if exists {
          return Ok(false);
        }
        row.insert(&tx)?;
        tx.commit()?;
        Ok(true)
      })
      .await
      .map_err(|e| write_error(e, &record.service_name, Error::AlreadyExists))?;

    if !inserted {
      return Err(Error::AlreadyExists(record.service_name));
    }

    info!(
      service_name = %record.service_name,
      id = %record.id,
      "inserted knowledge version 1"
    );
    Ok(record)
  }

  async fn upsert(&self, input: NewKnowledge) -> Result<Upserted> {
    let mut record = self.prepare(input)?;
    let mut row = EncodedRecord::from_record(&record)?;
    let depth = self.config.retention_depth as i64;

    let outcome = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock before the current version is read,
        // so no other writer can interleave between read and insert.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current: Option<String> = tx
          .query_row(
            "SELECT id FROM knowledge WHERE service_name = ?1 AND is_current = 1",
            rusqlite::params![row.service_name],
            |r| r.get(0),
          )
          .optional()?;
        let max_version: Option<i64> = tx.query_row(
          "SELECT MAX(version) FROM knowledge WHERE service_name = ?1",
          rusqlite::params![row.service_name],
          |r| r.get(0),
        )?;

        // Demote before inserting: the partial unique index admits only one
        // current row per key at any moment.
        if let Some(prev) = &current {
          tx.execute(
            "UPDATE knowledge SET is_current = 0, updated_at = ?2 WHERE id = ?1",
            rusqlite::params![prev, row.created_at],
          )?;
        }

        row.version = max_version.map_or(1, |v| v + 1);
        row.insert(&tx)?;

        let pruned = tx.execute(
          "DELETE FROM knowledge
           WHERE service_name = ?1
             AND is_current = 0
             AND version NOT IN (
               SELECT version FROM knowledge
               WHERE service_name = ?1
               ORDER BY version DESC
               LIMIT ?2
             )",
          rusqlite::params![row.service_name, depth],
        )?;

        tx.commit()?;
        Ok(UpsertOutcome {
          version: row.version,
          created: max_version.is_none(),
          superseded: current,
          pruned,
        })
      })
      .await
      .map_err(|e| write_error(e, &record.service_name, Error::Conflict))?;

    record.version = u32::try_from(outcome.version)
      .map_err(|_| Error::Decode(format!("version {} out of range", outcome.version)))?;

    info!(
      service_name = %record.service_name,
      id = %record.id,
      version = record.version,
      created = outcome.created,
      superseded = outcome.superseded.as_deref().unwrap_or("-"),
      pruned = outcome.pruned,
      "upserted knowledge"
    );
    Ok(Upserted { record, created: outcome.created })
  }

  async fn set_metadata(&self, service_name: &str, metadata: Metadata) -> Result<KnowledgeRecord> {
    let key = validate::service_name(service_name)?.to_owned();
    let meta_str = encode_metadata(&metadata)?;
    let at_str = encode_dt(now());

    let key_in = key.clone();
    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE knowledge SET metadata = ?2, updated_at = ?3
           WHERE service_name = ?1 AND is_current = 1",
          rusqlite::params![key_in, meta_str, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!(
            "SELECT {RECORD_COLUMNS} FROM knowledge WHERE service_name = ?1 AND is_current = 1"
          ),
          rusqlite::params![key_in],
          RawRecord::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await
      .map_err(|e| write_error(e, &key, Error::Conflict))?;

    let record = raw.ok_or_else(|| Error::NotFound(key.clone()))?.into_record()?;
    info!(service_name = %key, version = record.version, "replaced metadata");
    Ok(record)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_current(&self, service_name: &str) -> Result<Option<KnowledgeRecord>> {
    const SQL: &str = "SELECT id, service_name, version, content, embedding, metadata, \
                       is_current, created_at, updated_at
                       FROM knowledge WHERE service_name = ?1 AND is_current = 1";

    let mut records = self.query_records(SQL, service_name).await?;
    debug!(service_name, found = !records.is_empty(), "get_current");
    Ok(records.pop())
  }

  async fn history(&self, service_name: &str) -> Result<Vec<KnowledgeRecord>> {
    const SQL: &str = "SELECT id, service_name, version, content, embedding, metadata, \
                       is_current, created_at, updated_at
                       FROM knowledge WHERE service_name = ?1 ORDER BY version DESC";

    self.query_records(SQL, service_name).await
  }

  async fn similarity_search(&self, query: &SimilarityQuery) -> Result<Vec<ScoredRecord>> {
    validate::embedding(&query.embedding, self.config.dimensions)?;
    validate::limit(query.k)?;
    validate::threshold(query.threshold)?;

    let query_blob = encode_embedding(&query.embedding);
    let limit = i64::try_from(query.k).unwrap_or(i64::MAX);
    let key = query.service_name.as_deref().map(|s| s.trim().to_owned());
    let threshold = query.threshold;

    let raws: Vec<(RawRecord, f64)> = self
      .conn
      .call(move |conn| {
        // The threshold filters the scored candidates before LIMIT truncates
        // them. The trailing service_name makes the order total.
        let mut stmt = conn.prepare_cached(&format!(
          "SELECT {RECORD_COLUMNS}, score FROM (
             SELECT {RECORD_COLUMNS}, cosine_similarity(embedding, ?1) AS score
             FROM knowledge
             WHERE is_current = 1
               AND (?3 IS NULL OR service_name = ?3)
           )
           WHERE ?4 IS NULL OR score >= ?4
           ORDER BY score DESC, updated_at DESC, service_name ASC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![query_blob, limit, key, threshold], |row| {
            Ok((RawRecord::from_row(row)?, row.get(9)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let results = raws
      .into_iter()
      .map(|(raw, score)| Ok(ScoredRecord { record: raw.into_record()?, score }))
      .collect::<Result<Vec<_>>>()?;

    debug!(
      k = query.k,
      threshold = ?query.threshold,
      service_name = ?query.service_name,
      hits = results.len(),
      "similarity search"
    );
    Ok(results)
  }
}
