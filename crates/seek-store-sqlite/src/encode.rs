//! Encoding and decoding helpers between Rust domain types and the
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! Embeddings are stored as raw native-endian `f32` bytes. Metadata is compact
//! JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use seek_core::record::{KnowledgeRecord, Metadata};
use uuid::Uuid;
use zerocopy::IntoBytes as _;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── Embedding ───────────────────────────────────────────────────────────────

pub fn encode_embedding(v: &[f32]) -> Vec<u8> { v.as_bytes().to_vec() }

pub fn decode_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
  const WIDTH: usize = size_of::<f32>();
  if bytes.len() % WIDTH != 0 {
    return Err(Error::Decode(format!(
      "embedding blob of {} bytes is not a whole number of f32s",
      bytes.len()
    )));
  }
  let mut out = vec![0.0f32; bytes.len() / WIDTH];
  out.as_mut_bytes().copy_from_slice(bytes);
  Ok(out)
}

// ─── Metadata ────────────────────────────────────────────────────────────────

pub fn encode_metadata(m: &Metadata) -> Result<String> {
  Ok(serde_json::to_string(m)?)
}

pub fn decode_metadata(s: &str) -> Result<Metadata> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every query that materialises a [`RawRecord`].
pub const RECORD_COLUMNS: &str = "id, service_name, version, content, embedding, \
                                  metadata, is_current, created_at, updated_at";

/// A record encoded for binding into an `INSERT`.
pub struct EncodedRecord {
  pub id:           String,
  pub service_name: String,
  pub version:      i64,
  pub content:      String,
  pub embedding:    Vec<u8>,
  pub metadata:     String,
  pub created_at:   String,
}

impl EncodedRecord {
  pub fn from_record(r: &KnowledgeRecord) -> Result<Self> {
    Ok(Self {
      id:           encode_uuid(r.id),
      service_name: r.service_name.clone(),
      version:      i64::from(r.version),
      content:      r.content.clone(),
      embedding:    encode_embedding(&r.embedding),
      metadata:     encode_metadata(&r.metadata)?,
      created_at:   encode_dt(r.created_at),
    })
  }

  /// Insert as the current version of its key; `updated_at` equals
  /// `created_at` for a fresh row.
  pub fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO knowledge (
         id, service_name, version, content, embedding,
         metadata, is_current, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
      rusqlite::params![
        self.id,
        self.service_name,
        self.version,
        self.content,
        self.embedding,
        self.metadata,
        self.created_at,
      ],
    )?;
    Ok(())
  }
}

/// Raw values read directly from a `knowledge` row.
pub struct RawRecord {
  pub id:           String,
  pub service_name: String,
  pub version:      i64,
  pub content:      String,
  pub embedding:    Vec<u8>,
  pub metadata:     String,
  pub is_current:   bool,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawRecord {
  /// Read the [`RECORD_COLUMNS`] from the start of `row`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      service_name: row.get(1)?,
      version:      row.get(2)?,
      content:      row.get(3)?,
      embedding:    row.get(4)?,
      metadata:     row.get(5)?,
      is_current:   row.get(6)?,
      created_at:   row.get(7)?,
      updated_at:   row.get(8)?,
    })
  }

  pub fn into_record(self) -> Result<KnowledgeRecord> {
    let version = u32::try_from(self.version)
      .map_err(|_| Error::Decode(format!("version {} out of range", self.version)))?;

    Ok(KnowledgeRecord {
      id: decode_uuid(&self.id)?,
      service_name: self.service_name,
      version,
      content: self.content,
      embedding: decode_embedding(&self.embedding)?,
      metadata: decode_metadata(&self.metadata)?,
      is_current: self.is_current,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_are_fixed_width() {
    let a = encode_dt("2026-01-02T03:04:05Z".parse().unwrap());
    let b = encode_dt("2026-01-02T03:04:05.5Z".parse().unwrap());
    assert_eq!(a, "2026-01-02T03:04:05.000000Z");
    assert_eq!(a.len(), b.len());
    assert!(a < b);
  }

  #[test]
  fn embedding_bytes_roundtrip() {
    let v = vec![0.25f32, -1.5, 3.0];
    let bytes = encode_embedding(&v);
    assert_eq!(bytes.len(), 12);
    assert_eq!(decode_embedding(&bytes).unwrap(), v);
  }

  #[test]
  fn ragged_embedding_blob_rejected() {
    assert!(matches!(decode_embedding(&[0, 1, 2]), Err(Error::Decode(_))));
  }
}
