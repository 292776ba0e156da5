//! Encrypted SQLite statistics store.
//!
//! Persists per-instance, per-month counters and itemized AP entries as one
//! authenticated-encrypted blob per (instance, month) row.
//!
//! # Architecture
//!
//! - `table`: the backing table; bytes in, bytes out
//! - `codec`: versioned plaintext encoding of [`StatsRecord`]
//! - `statvault-crypto`: per-instance keys and XChaCha20-Poly1305 sealing
//! - [`Store`]: read-decrypt-modify-encrypt-write cycles and fail-closed reads
//!
//! # Example
//!
//! ```no_run
//! use statvault_storage::{Store, StoreConfig};
//!
//! let store = Store::open(StoreConfig::new("stats.db", "a long master secret"))?;
//! store.increment_battle_count("main")?;
//! store.add_akashi_ap_entry("main", 120, 60, 2, "akashi")?;
//! let stats = store.get_current_stats("main")?;
//! assert_eq!(stats.akashi_ap, 120);
//! # Ok::<(), statvault_storage::StorageError>(())
//! ```

mod clock;
pub mod codec;
mod config;
mod error;
mod store;
mod table;

pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{CodecError, FORMAT_VERSION};
pub use config::{DEFAULT_BUSY_TIMEOUT_MS, MasterSecret, StoreConfig};
pub use error::{StorageError, StorageResult};
pub use store::{AuditEntry, ReadFailure, RowHealth, Store};
pub use table::TABLE_NAME;

pub use statvault_crypto::{HEADER_SIZE, KdfParams};
pub use statvault_types::{ApEntry, Month, StatsRecord};
