//! SQL schema and custom functions for the Seek SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema version; a database written by a newer schema is refused.

use rusqlite::{Connection, functions::FunctionFlags};

use crate::encode::decode_embedding;

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Every version of every key. Content and embedding are write-once; only
-- is_current, updated_at and (on the current row) metadata ever change.
CREATE TABLE IF NOT EXISTS knowledge (
    id           TEXT PRIMARY KEY,
    service_name TEXT NOT NULL,
    version      INTEGER NOT NULL CHECK (version >= 1),
    content      TEXT NOT NULL,
    embedding    BLOB NOT NULL,           -- native-endian f32 x dimensions
    metadata     TEXT NOT NULL DEFAULT '{}',
    is_current   INTEGER NOT NULL CHECK (is_current IN (0, 1)),
    created_at   TEXT NOT NULL,           -- RFC 3339 UTC, microseconds
    updated_at   TEXT NOT NULL,
    UNIQUE (service_name, version)
);

-- At most one current row per key.
CREATE UNIQUE INDEX IF NOT EXISTS knowledge_current_key_idx
    ON knowledge(service_name) WHERE is_current = 1;

-- Candidate set for similarity search: current rows only.
CREATE INDEX IF NOT EXISTS knowledge_current_search_idx
    ON knowledge(updated_at, service_name) WHERE is_current = 1;

CREATE TABLE IF NOT EXISTS store_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Value stored in `PRAGMA user_version` once [`SCHEMA`] is applied.
pub const SCHEMA_VERSION: i64 = 1;

/// Name of the scalar SQL function returning `1 - cosine distance`.
pub const COSINE_SIMILARITY: &str = "cosine_similarity";

/// Register the functions the queries in `store.rs` rely on. Must run on
/// every connection before any search.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    COSINE_SIMILARITY,
    2,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let stored: Vec<u8> = ctx.get(0)?;
      let query: Vec<u8> = ctx.get(1)?;
      let to_fn_err =
        |e: crate::Error| rusqlite::Error::UserFunctionError(e.to_string().into());
      let stored = decode_embedding(&stored).map_err(to_fn_err)?;
      let query = decode_embedding(&query).map_err(to_fn_err)?;
      Ok(seek_core::vector::cosine_similarity(&stored, &query))
    },
  )
}
