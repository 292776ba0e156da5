//! Backing table access.
//!
//! One row per (instance, month) holding an opaque blob. This module moves
//! bytes only; it never sees plaintext.

use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::time::Duration;

/// Name of the backing table.
pub const TABLE_NAME: &str = "stat_blobs";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS stat_blobs (
    instance TEXT NOT NULL,
    month TEXT NOT NULL,
    encrypted_blob BLOB NOT NULL,
    PRIMARY KEY (instance, month)
) WITHOUT ROWID;
";

/// Contents of the `encrypted_blob` column.
///
/// The store only ever writes BLOBs. Any other storage class was written by
/// something else and can never be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoredBlob {
    Blob(Vec<u8>),
    Foreign { kind: Type, bytes: Vec<u8> },
}

impl StoredBlob {
    fn from_value(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Blob(bytes) => StoredBlob::Blob(bytes.to_vec()),
            ValueRef::Text(text) => StoredBlob::Foreign {
                kind: Type::Text,
                bytes: text.to_vec(),
            },
            ValueRef::Integer(i) => StoredBlob::Foreign {
                kind: Type::Integer,
                bytes: i.to_string().into_bytes(),
            },
            ValueRef::Real(f) => StoredBlob::Foreign {
                kind: Type::Real,
                bytes: f.to_string().into_bytes(),
            },
            ValueRef::Null => StoredBlob::Foreign {
                kind: Type::Null,
                bytes: Vec::new(),
            },
        }
    }

    /// Raw bytes as SQLite would render them with `CAST(... AS BLOB)`.
    pub fn bytes(&self) -> &[u8] {
        match self {
            StoredBlob::Blob(bytes) | StoredBlob::Foreign { bytes, .. } => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            StoredBlob::Blob(bytes) | StoredBlob::Foreign { bytes, .. } => bytes,
        }
    }
}

/// A stored row as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredRow {
    pub instance: String,
    pub month: String,
    pub encrypted_blob: StoredBlob,
}

/// Opens a connection with the busy timeout applied.
pub(crate) fn connect(path: &Path, busy_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

/// Enables WAL and creates the table. Idempotent.
pub(crate) fn init(conn: &Connection) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!(journal_mode = %mode, "journal mode set");
    conn.execute_batch(SCHEMA)
}

pub(crate) fn load(
    conn: &Connection,
    instance: &str,
    month: &str,
) -> rusqlite::Result<Option<StoredBlob>> {
    conn.query_row(
        "SELECT encrypted_blob FROM stat_blobs WHERE instance = ?1 AND month = ?2",
        params![instance, month],
        |row| row.get_ref(0).map(StoredBlob::from_value),
    )
    .optional()
}

pub(crate) fn upsert(
    conn: &Connection,
    instance: &str,
    month: &str,
    blob: &[u8],
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO stat_blobs (instance, month, encrypted_blob) VALUES (?1, ?2, ?3)
         ON CONFLICT(instance, month) DO UPDATE SET encrypted_blob = excluded.encrypted_blob",
        params![instance, month, blob],
    )?;
    Ok(())
}

/// Months stored for `instance`, ascending.
pub(crate) fn months(conn: &Connection, instance: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT month FROM stat_blobs WHERE instance = ?1 ORDER BY month")?;
    let rows = stmt.query_map(params![instance], |row| row.get(0))?;
    rows.collect()
}

/// Every stored row, ordered by key.
pub(crate) fn rows(conn: &Connection) -> rusqlite::Result<Vec<StoredRow>> {
    let mut stmt = conn.prepare(
        "SELECT instance, month, encrypted_blob FROM stat_blobs ORDER BY instance, month",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(StoredRow {
            instance: row.get(0)?,
            month: row.get(1)?,
            encrypted_blob: StoredBlob::from_value(row.get_ref(2)?),
        })
    })?;
    rows.collect()
}
