//! Key derivation and management.
//!
//! Three tiers:
//!
//! 1. Master key: the configured secret stretched once with Argon2id.
//! 2. Instance key: HKDF-SHA256 of the master key, bound to the instance id.
//! 3. Record key: HKDF-SHA256 of the instance key under a random per-record
//!    salt carried in the blob header.
//!
//! Only the per-record salt is ever persisted.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Argon2, Params, Version};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of encryption keys in bytes (256 bits for XChaCha20).
pub const KEY_SIZE: usize = 32;

/// Size of the per-record salt in bytes.
pub const SALT_SIZE: usize = 8;

/// Minimum accepted master secret length in bytes.
pub const MIN_SECRET_LEN: usize = 8;

/// Argon2 salt for the master key. The master secret is the only input that
/// varies between deployments.
const MASTER_SALT: &[u8] = b"statvault.master.v1";

const INSTANCE_INFO: &[u8] = b"statvault/instance/v1:";
const RECORD_INFO: &[u8] = b"statvault/record/v1";

/// Key derivation parameters.
///
/// Default values are tuned for a balance of security and performance
/// on modern hardware.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP recommendations for Argon2id (2023)
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Root key for a store, derived from the configured master secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    /// Stretches `secret` into a master key using Argon2id.
    ///
    /// Runs once per store; instance keys are cheap to derive afterwards.
    pub fn derive(secret: &[u8], params: &KdfParams) -> CryptoResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(CryptoError::InvalidSecret(format!(
                "must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        let argon2_params = Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut bytes = [0u8; KEY_SIZE];
        argon2
            .hash_password_into(secret, MASTER_SALT, &mut bytes)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        Ok(Self { bytes })
    }

    /// Wraps existing key material (e.g. from a keyring) without stretching.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Derives the key that protects every record of `instance`.
    ///
    /// Deterministic: the same instance always yields the same key.
    pub fn derive_instance_key(&self, instance: &str) -> CryptoResult<InstanceKey> {
        let hk = Hkdf::<Sha256>::new(None, &self.bytes);
        let mut bytes = [0u8; KEY_SIZE];
        hk.expand_multi_info(&[INSTANCE_INFO, instance.as_bytes()], &mut bytes)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(InstanceKey { bytes })
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Per-instance key. Never stored.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct InstanceKey {
    bytes: [u8; KEY_SIZE],
}

impl InstanceKey {
    /// Creates an instance key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Derives the subkey for one record from its header salt.
    pub(crate) fn record_key(
        &self,
        salt: &[u8; SALT_SIZE],
    ) -> CryptoResult<Zeroizing<[u8; KEY_SIZE]>> {
        let hk = Hkdf::<Sha256>::new(Some(&salt[..]), &self.bytes);
        let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
        hk.expand(RECORD_INFO, &mut okm[..])
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(okm)
    }
}

impl std::fmt::Debug for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generates a random per-record salt.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Generates a random instance key (tests and ad-hoc tooling).
pub fn generate_random_key() -> InstanceKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    InstanceKey::from_bytes(bytes)
}
