//! Encryption layer for statvault.
//!
//! Every record is sealed with XChaCha20-Poly1305 under a key that is unique to
//! its instance and re-salted on every write:
//!
//! - [`MasterKey`]: Argon2id stretch of the configured secret, derived once.
//! - [`InstanceKey`]: HKDF-SHA256 of the master key and the instance id.
//! - Per-record subkey: HKDF-SHA256 of the instance key and a random salt
//!   stored in the blob header.
//!
//! Decryption verifies the Poly1305 tag before returning plaintext, so a
//! flipped bit anywhere in the blob, or a blob presented under the wrong
//! instance or row key, is rejected with
//! [`CryptoError::AuthenticationFailure`].

mod cipher;
mod error;
mod key;

pub use cipher::{
    EncryptedBlob, HEADER_SIZE, NONCE_SIZE, TAG_SIZE, decrypt, encrypt, open, seal,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    InstanceKey, KEY_SIZE, KdfParams, MIN_SECRET_LEN, MasterKey, SALT_SIZE, generate_random_key,
    generate_salt,
};
