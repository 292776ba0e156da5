//! Core type definitions for statvault.
//!
//! This crate defines the plaintext types shared by the crypto and storage
//! layers:
//! - `Month` period keys (`"YYYY-MM"`)
//! - `StatsRecord` counters and their itemized `ApEntry` list
//!
//! Nothing here knows about encryption or persistence.

mod month;
mod record;

pub use month::Month;
pub use record::{ApEntry, StatsRecord};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid month {0:?}: expected YYYY-MM")]
    InvalidMonth(String),
}
