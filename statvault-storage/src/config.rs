//! Store configuration.
//!
//! Everything the store needs is passed in explicitly through [`StoreConfig`];
//! nothing is read from process-global state.

use crate::error::{StorageError, StorageResult};
use serde::Deserialize;
use statvault_crypto::KdfParams;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroizing;

/// Default time a writer waits for another writer's transaction.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Secret the store keys are derived from. Zeroized on drop, never printed.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub struct MasterSecret(Zeroizing<String>);

impl MasterSecret {
    /// Returns the secret bytes.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<String> for MasterSecret {
    fn from(secret: String) -> Self {
        Self(Zeroizing::new(secret))
    }
}

impl From<&str> for MasterSecret {
    fn from(secret: &str) -> Self {
        Self(Zeroizing::new(secret.to_string()))
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterSecret([REDACTED])")
    }
}

/// Configuration for opening a [`Store`](crate::Store).
///
/// JSON form:
///
/// ```json
/// {
///   "path": "stats.db",
///   "master_secret": "…",
///   "kdf": { "memory_cost": 19456, "time_cost": 2, "parallelism": 1 },
///   "busy_timeout_ms": 5000
/// }
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Master secret for key derivation.
    pub master_secret: MasterSecret,
    /// Argon2id parameters for stretching the master secret.
    #[serde(default)]
    pub kdf: KdfParams,
    /// How long a mutation waits for a concurrent writer.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    /// Creates a config with default KDF parameters and busy timeout.
    pub fn new(path: impl Into<PathBuf>, master_secret: impl Into<MasterSecret>) -> Self {
        Self {
            path: path.into(),
            master_secret: master_secret.into(),
            kdf: KdfParams::default(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// Overrides the KDF parameters.
    #[must_use]
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Overrides the busy timeout.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Busy timeout as a `Duration`.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Parses a JSON config.
    pub fn from_json_str(json: &str) -> StorageResult<Self> {
        serde_json::from_str(json).map_err(|e| StorageError::Config(e.to_string()))
    }

    /// Loads a JSON config file.
    ///
    /// A relative `path` inside the file is resolved against the file's
    /// directory.
    pub fn from_json_file(file: &Path) -> StorageResult<Self> {
        let json = std::fs::read_to_string(file)
            .map_err(|e| StorageError::Config(format!("{}: {e}", file.display())))?;
        let mut config = Self::from_json_str(&json)
            .map_err(|e| StorageError::Config(format!("{}: {e}", file.display())))?;

        if config.path.is_relative() {
            if let Some(dir) = file.parent() {
                config.path = dir.join(&config.path);
            }
        }
        Ok(config)
    }
}
