//! Error types for the encryption layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// The master secret does not meet the minimum requirements.
    #[error("invalid master secret: {0}")]
    InvalidSecret(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Tag verification failed (wrong key, tampered header, ciphertext, tag or AAD).
    #[error("authentication failed (wrong key or tampered data)")]
    AuthenticationFailure,

    /// Blob too short to hold a header and tag.
    #[error("malformed blob: expected at least {expected} bytes, got {actual}")]
    MalformedBlob { expected: usize, actual: usize },
}

impl CryptoError {
    /// Returns true for failures that mean the stored bytes cannot be trusted.
    ///
    /// A truncated blob is indistinguishable from tampering, so it counts.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            CryptoError::AuthenticationFailure | CryptoError::MalformedBlob { .. }
        )
    }
}
