//! Shared test helpers for store tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, params};
use statvault_crypto::{MasterKey, seal};
use statvault_storage::{FixedClock, KdfParams, Store, StoreConfig, TABLE_NAME};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const SECRET: &str = "test master secret";

/// Fast KDF params for testing (low memory/iterations for speed)
pub fn fast_kdf() -> KdfParams {
    KdfParams {
        memory_cost: 1024, // 1 MiB
        time_cost: 1,
        parallelism: 1,
    }
}

/// Mid-February 2026, matching the reference scenario month.
pub fn feb_2026() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 15, 9, 30, 0).unwrap()
}

pub fn config(path: &Path) -> StoreConfig {
    StoreConfig::new(path, SECRET)
        .with_kdf(fast_kdf())
        .with_busy_timeout(Duration::from_secs(30))
}

/// A store in a temp directory with a clock pinned to February 2026.
pub struct TestStore {
    pub dir: TempDir,
    pub store: Store,
    pub clock: Arc<FixedClock>,
}

impl TestStore {
    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("stats.db")
    }

    /// Reopens the same file with another secret.
    pub fn reopen_with_secret(&self, secret: &str) -> Store {
        let config = StoreConfig::new(self.db_path(), secret)
            .with_kdf(fast_kdf())
            .with_busy_timeout(Duration::from_secs(30));
        Store::open_with_clock(config, self.clock.clone()).unwrap()
    }
}

pub fn open_store() -> TestStore {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(FixedClock::new(feb_2026()));
    let store =
        Store::open_with_clock(config(&dir.path().join("stats.db")), clock.clone()).unwrap();
    TestStore { dir, store, clock }
}

// ── Direct table access (out-of-band edits) ──────────────────────

pub fn read_blob(path: &Path, instance: &str, month: &str) -> Vec<u8> {
    let conn = Connection::open(path).unwrap();
    conn.query_row(
        &format!("SELECT encrypted_blob FROM {TABLE_NAME} WHERE instance = ?1 AND month = ?2"),
        params![instance, month],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn write_blob(path: &Path, instance: &str, month: &str, blob: &[u8]) {
    let conn = Connection::open(path).unwrap();
    conn.execute(
        &format!(
            "INSERT INTO {TABLE_NAME} (instance, month, encrypted_blob) VALUES (?1, ?2, ?3)
             ON CONFLICT(instance, month) DO UPDATE SET encrypted_blob = excluded.encrypted_blob"
        ),
        params![instance, month, blob],
    )
    .unwrap();
}

/// Rewrites the stored value so its storage class is TEXT with the same bytes.
pub fn retype_as_text(path: &Path, instance: &str, month: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute(
        &format!(
            "UPDATE {TABLE_NAME} SET encrypted_blob = encrypted_blob || ''
             WHERE instance = ?1 AND month = ?2"
        ),
        params![instance, month],
    )
    .unwrap();
}

/// Flips every bit of the byte at `offset` in the stored blob.
pub fn tamper(path: &Path, instance: &str, month: &str, offset: usize) {
    let mut blob = read_blob(path, instance, month);
    blob[offset] ^= 0xFF;
    write_blob(path, instance, month, &blob);
}

/// Seals arbitrary plaintext exactly as the store would for this key.
pub fn seal_for(instance: &str, month: &str, plaintext: &[u8]) -> Vec<u8> {
    let master = MasterKey::derive(SECRET.as_bytes(), &fast_kdf()).unwrap();
    let key = master.derive_instance_key(instance).unwrap();
    let mut aad = instance.as_bytes().to_vec();
    aad.push(0);
    aad.extend_from_slice(month.as_bytes());
    seal(&key, plaintext, &aad).unwrap()
}
