//! Error types for the storage layer.

use crate::codec::CodecError;
use chrono::{DateTime, Utc};
use statvault_crypto::CryptoError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced to callers of the store.
///
/// Authentication and decode failures of stored records are not in this list:
/// reads recover from them locally and return an empty record.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Key setup or sealing failed.
    #[error("encryption error: {0}")]
    Crypto(#[from] CryptoError),

    /// A record could not be encoded for writing.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller supplied an invalid instance or month.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The clock reads a time whose year has no `YYYY-MM` key.
    #[error("clock time {0} is outside the representable month range")]
    ClockOutOfRange(DateTime<Utc>),
}
