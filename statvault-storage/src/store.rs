//! Encrypted statistics store.
//!
//! Every mutation is one IMMEDIATE transaction: select, decrypt, decode,
//! mutate, encode, encrypt under fresh randomness, upsert, commit. Taking the
//! write lock before the select serializes concurrent read-modify-write cycles
//! across threads and processes.
//!
//! Reads fail closed. A row that does not authenticate or decode is reported
//! to the caller as an empty record and logged at `warn` with the cause.

use crate::clock::{Clock, SystemClock};
use crate::codec::{self, CodecError};
use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::table::{self, StoredBlob};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use statvault_crypto::{CryptoError, HEADER_SIZE, InstanceKey, MasterKey, TAG_SIZE};
use statvault_types::{ApEntry, Month, StatsRecord};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Why a stored row could not be turned into a record.
///
/// Never returned by `get_stats`; used for logging and [`Store::audit`].
#[derive(Debug, Error)]
pub enum ReadFailure {
    /// The blob did not authenticate under the instance key and row binding.
    #[error("authentication failure: {0}")]
    Authentication(#[source] CryptoError),

    /// The blob authenticated but the plaintext is not a valid record.
    #[error("malformed record: {0}")]
    Malformed(#[source] CodecError),
}

impl ReadFailure {
    /// Stable label for log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            ReadFailure::Authentication(_) => "authentication_failure",
            ReadFailure::Malformed(_) => "malformed_record",
        }
    }
}

/// Integrity state of one stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowHealth {
    Valid,
    AuthenticationFailure,
    Malformed,
}

impl From<&ReadFailure> for RowHealth {
    fn from(failure: &ReadFailure) -> Self {
        match failure {
            ReadFailure::Authentication(_) => RowHealth::AuthenticationFailure,
            ReadFailure::Malformed(_) => RowHealth::Malformed,
        }
    }
}

/// One row of an [`Store::audit`] report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub instance: String,
    pub month: String,
    pub blob_len: usize,
    pub health: RowHealth,
}

/// Handle to an encrypted statistics database.
///
/// Holds no connection between calls; every operation opens, uses and closes
/// its own. `Store` is `Send + Sync` and can be shared behind an `Arc`.
pub struct Store {
    path: PathBuf,
    master: MasterKey,
    busy_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("busy_timeout", &self.busy_timeout)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Opens or creates the store described by `config`, using the wall clock.
    pub fn open(config: StoreConfig) -> StorageResult<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Opens or creates the store with an explicit clock.
    ///
    /// Derives the master key (Argon2id, the expensive step) and creates the
    /// schema if missing.
    pub fn open_with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> StorageResult<Self> {
        let master = MasterKey::derive(config.master_secret.expose(), &config.kdf)?;

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            busy_timeout: config.busy_timeout(),
            path: config.path,
            master,
            clock,
        };

        let conn = store.connect()?;
        table::init(&conn)?;
        info!(path = %store.path.display(), "stats store opened");

        Ok(store)
    }

    /// Database file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Month that mutations currently target.
    pub fn current_month(&self) -> StorageResult<Month> {
        month_of(self.clock.now())
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Adds one battle to the current month of `instance`.
    pub fn increment_battle_count(&self, instance: &str) -> StorageResult<()> {
        self.mutate(instance, |record, _| record.record_battle())
    }

    /// Appends an AP entry to the current month of `instance` and adds
    /// `amount` to its accumulator.
    pub fn add_akashi_ap_entry(
        &self,
        instance: &str,
        amount: u64,
        base: u64,
        count: u64,
        source: &str,
    ) -> StorageResult<()> {
        self.mutate(instance, |record, now| {
            record.push_ap_entry(ApEntry::new(amount, base, count, source, now));
        })
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Returns the statistics for `instance` in `month` (`YYYY-MM`).
    ///
    /// Missing, tampered and undecodable rows all yield
    /// [`StatsRecord::empty`]. Errors are returned only for storage failures
    /// and invalid arguments.
    pub fn get_stats(&self, instance: &str, month: &str) -> StorageResult<StatsRecord> {
        validate_instance(instance)?;
        let month: Month = month
            .parse()
            .map_err(|e: statvault_types::Error| StorageError::InvalidInput(e.to_string()))?;
        self.read(instance, month)
    }

    /// Returns the statistics for `instance` in the current month.
    pub fn get_current_stats(&self, instance: &str) -> StorageResult<StatsRecord> {
        validate_instance(instance)?;
        self.read(instance, self.current_month()?)
    }

    /// Months that have a stored row for `instance`, oldest first.
    ///
    /// Reads only the plaintext key columns.
    pub fn list_months(&self, instance: &str) -> StorageResult<Vec<Month>> {
        validate_instance(instance)?;
        let conn = self.connect()?;
        let months = table::months(&conn, instance)?;

        Ok(months
            .into_iter()
            .filter_map(|m| match m.parse::<Month>() {
                Ok(month) => Some(month),
                Err(_) => {
                    warn!(instance, month = %m, "skipping row with invalid month key");
                    None
                }
            })
            .collect())
    }

    /// Raw stored bytes for a key, for external inspection tooling.
    pub fn raw_blob(&self, instance: &str, month: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_instance(instance)?;
        let month: Month = month
            .parse()
            .map_err(|e: statvault_types::Error| StorageError::InvalidInput(e.to_string()))?;
        let conn = self.connect()?;
        Ok(table::load(&conn, instance, &month.to_string())?.map(StoredBlob::into_bytes))
    }

    /// Checks every stored row without modifying anything.
    ///
    /// Unlike `get_stats`, this reports why a row is unreadable.
    pub fn audit(&self) -> StorageResult<Vec<AuditEntry>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let rows = table::rows(&tx)?;
        tx.commit()?;

        let mut keys: HashMap<String, InstanceKey> = HashMap::new();
        let mut report = Vec::with_capacity(rows.len());

        for row in rows {
            let key = match keys.entry(row.instance.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    entry.insert(self.master.derive_instance_key(&row.instance)?)
                }
            };

            let health = match open_record(key, &row.instance, &row.month, &row.encrypted_blob) {
                Ok(_) => RowHealth::Valid,
                Err(failure) => {
                    warn!(
                        instance = %row.instance,
                        month = %row.month,
                        reason = failure.reason(),
                        error = %failure,
                        "audit found unreadable record"
                    );
                    RowHealth::from(&failure)
                }
            };

            report.push(AuditEntry {
                blob_len: row.encrypted_blob.bytes().len(),
                instance: row.instance,
                month: row.month,
                health,
            });
        }

        Ok(report)
    }

    // ── Internals ────────────────────────────────────────────────

    fn connect(&self) -> StorageResult<Connection> {
        Ok(table::connect(&self.path, self.busy_timeout)?)
    }

    fn read(&self, instance: &str, month: Month) -> StorageResult<StatsRecord> {
        let key = self.master.derive_instance_key(instance)?;
        let month = month.to_string();

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let stored = table::load(&tx, instance, &month)?;
        tx.commit()?;

        let Some(stored) = stored else {
            debug!(instance, month = %month, "no stored record");
            return Ok(StatsRecord::empty());
        };

        match open_record(&key, instance, &month, &stored) {
            Ok(record) => Ok(record),
            Err(failure) => {
                warn!(
                    instance,
                    month = %month,
                    reason = failure.reason(),
                    error = %failure,
                    "stored record unreadable, returning empty stats"
                );
                Ok(StatsRecord::empty())
            }
        }
    }

    fn mutate<F>(&self, instance: &str, apply: F) -> StorageResult<()>
    where
        F: FnOnce(&mut StatsRecord, DateTime<Utc>),
    {
        validate_instance(instance)?;
        let now = self.clock.now();
        let month = month_of(now)?.to_string();
        let key = self.master.derive_instance_key(instance)?;

        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut record = match table::load(&tx, instance, &month)? {
            None => StatsRecord::empty(),
            Some(stored) => match open_record(&key, instance, &month, &stored) {
                Ok(record) => record,
                Err(failure) => {
                    warn!(
                        instance,
                        month = %month,
                        reason = failure.reason(),
                        error = %failure,
                        "stored record unreadable, starting a fresh record"
                    );
                    StatsRecord::empty()
                }
            },
        };

        apply(&mut record, now);

        let plaintext = Zeroizing::new(codec::encode(&record)?);
        let blob = statvault_crypto::seal(&key, &plaintext, &row_aad(instance, &month))?;
        table::upsert(&tx, instance, &month, &blob)?;
        tx.commit()?;

        debug!(
            instance,
            month = %month,
            battle_count = record.battle_count,
            entries = record.akashi_ap_entries.len(),
            "stats record written"
        );
        Ok(())
    }
}

/// Associated data binding a blob to its row key.
///
/// Month keys have a fixed width, so `instance ‖ 0x00 ‖ month` is unambiguous.
fn row_aad(instance: &str, month: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(instance.len() + 1 + month.len());
    aad.extend_from_slice(instance.as_bytes());
    aad.push(0);
    aad.extend_from_slice(month.as_bytes());
    aad
}

fn open_record(
    key: &InstanceKey,
    instance: &str,
    month: &str,
    stored: &StoredBlob,
) -> Result<StatsRecord, ReadFailure> {
    let bytes = match stored {
        StoredBlob::Blob(bytes) => bytes,
        StoredBlob::Foreign { kind, bytes } => {
            debug!(
                instance,
                month,
                column_type = %kind,
                "blob column holds a non-BLOB value"
            );
            return Err(ReadFailure::Authentication(CryptoError::MalformedBlob {
                expected: HEADER_SIZE + TAG_SIZE,
                actual: bytes.len(),
            }));
        }
    };
    let plaintext = statvault_crypto::open(key, bytes, &row_aad(instance, month))
        .map_err(ReadFailure::Authentication)?;
    codec::decode(&plaintext).map_err(ReadFailure::Malformed)
}

fn month_of(now: DateTime<Utc>) -> StorageResult<Month> {
    Month::of(&now).ok_or(StorageError::ClockOutOfRange(now))
}

fn validate_instance(instance: &str) -> StorageResult<()> {
    if instance.is_empty() {
        return Err(StorageError::InvalidInput(
            "instance must not be empty".to_string(),
        ));
    }
    Ok(())
}
