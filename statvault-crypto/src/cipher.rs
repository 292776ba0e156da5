//! Record encryption using XChaCha20-Poly1305.
//!
//! Blob wire format (32-byte header, then sealed payload):
//!
//! ```text
//! [ salt (8) | nonce (24) | ciphertext + tag (n + 16) ]
//! ```
//!
//! The salt selects the per-record subkey, the nonce is drawn fresh for every
//! seal. Both are random, so a rewrite of the same record never reuses a
//! key/nonce pair.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{InstanceKey, SALT_SIZE, generate_salt};
use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::RngCore;
use zeroize::Zeroizing;

/// Size of nonce in bytes (192 bits for XChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 24;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Size of the blob header (salt + nonce).
pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE;

/// Sealed record with the randomness needed to open it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// Per-record key derivation salt.
    pub salt: [u8; SALT_SIZE],
    /// The nonce used for encryption (unique per encryption).
    pub nonce: [u8; NONCE_SIZE],
    /// The encrypted ciphertext (includes auth tag).
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Returns the total encoded size.
    pub fn len(&self) -> usize {
        HEADER_SIZE + self.ciphertext.len()
    }

    /// Returns true if the ciphertext is empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Returns the 32-byte header.
    pub fn header(&self) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[..SALT_SIZE].copy_from_slice(&self.salt);
        header[SALT_SIZE..].copy_from_slice(&self.nonce);
        header
    }

    /// Encodes to the stored byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.header());
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Decodes from the stored byte layout.
    ///
    /// Only checks the length; integrity is checked by [`decrypt`].
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < HEADER_SIZE + TAG_SIZE {
            return Err(CryptoError::MalformedBlob {
                expected: HEADER_SIZE + TAG_SIZE,
                actual: bytes.len(),
            });
        }

        let mut salt = [0u8; SALT_SIZE];
        salt.copy_from_slice(&bytes[..SALT_SIZE]);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[SALT_SIZE..HEADER_SIZE]);
        let ciphertext = bytes[HEADER_SIZE..].to_vec();

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }
}

/// Encrypts `plaintext` for the owner of `key`.
///
/// `aad` is authenticated but not stored; the same bytes must be supplied to
/// [`decrypt`].
pub fn encrypt(key: &InstanceKey, plaintext: &[u8], aad: &[u8]) -> CryptoResult<EncryptedBlob> {
    let salt = generate_salt();
    let record_key = key.record_key(&salt)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&record_key[..]));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedBlob {
        salt,
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypts a blob produced by [`encrypt`].
///
/// The tag is verified before any plaintext is released. Any mismatch yields
/// [`CryptoError::AuthenticationFailure`].
pub fn decrypt(
    key: &InstanceKey,
    blob: &EncryptedBlob,
    aad: &[u8],
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let record_key = key.record_key(&blob.salt)?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&record_key[..]));
    let nonce = XNonce::from_slice(&blob.nonce);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &blob.ciphertext,
                aad,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::AuthenticationFailure)
}

/// Decodes the stored layout and decrypts it in one step.
pub fn open(key: &InstanceKey, bytes: &[u8], aad: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let blob = EncryptedBlob::from_bytes(bytes)?;
    decrypt(key, &blob, aad)
}

/// Encrypts and encodes to the stored layout in one step.
pub fn seal(key: &InstanceKey, plaintext: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
    Ok(encrypt(key, plaintext, aad)?.to_bytes())
}
