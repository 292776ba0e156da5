//! Plaintext record codec.
//!
//! Layout: one format-version byte followed by the JSON body of the record.
//! Decoding only happens after the blob has authenticated, so a failure here
//! points at a version mismatch or a writer bug rather than tampering.

use statvault_types::StatsRecord;
use thiserror::Error;

/// Current plaintext format version.
pub const FORMAT_VERSION: u8 = 1;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors from encoding or decoding a record.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Decrypted bytes do not form a valid record.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Record could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Encodes a record. Deterministic for a given record.
pub fn encode(record: &StatsRecord) -> CodecResult<Vec<u8>> {
    let mut out = vec![FORMAT_VERSION];
    serde_json::to_writer(&mut out, record).map_err(CodecError::Encode)?;
    Ok(out)
}

/// Decodes a record produced by [`encode`].
pub fn decode(bytes: &[u8]) -> CodecResult<StatsRecord> {
    let (&version, body) = bytes
        .split_first()
        .ok_or_else(|| CodecError::MalformedRecord("empty payload".to_string()))?;

    if version != FORMAT_VERSION {
        return Err(CodecError::MalformedRecord(format!(
            "unsupported format version {version}"
        )));
    }

    let record: StatsRecord = serde_json::from_slice(body)
        .map_err(|e| CodecError::MalformedRecord(e.to_string()))?;

    if !record.is_consistent() {
        return Err(CodecError::MalformedRecord(format!(
            "akashi_ap {} does not match entry total {}",
            record.akashi_ap,
            record.entries_total()
        )));
    }

    Ok(record)
}
