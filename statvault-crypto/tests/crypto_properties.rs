//! Property-based tests for the crypto module.
//!
//! These tests verify security properties that must always hold:
//! - Encryption is reversible with the correct key and AAD
//! - Keys of other instances fail decryption
//! - Tampering anywhere in the blob is detected
//! - Instance keys are derived deterministically

use proptest::prelude::*;
use statvault_crypto::{
    CryptoError, EncryptedBlob, HEADER_SIZE, KEY_SIZE, MasterKey, decrypt, encrypt,
    generate_random_key, open, seal,
};

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn plaintext_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

fn instance_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_\\-]{1,40}").unwrap()
}

fn master_strategy() -> impl Strategy<Value = MasterKey> {
    prop::array::uniform32(any::<u8>()).prop_map(MasterKey::from_bytes)
}

// =============================================================================
// ENCRYPTION PROPERTIES
// =============================================================================

mod encryption_properties {
    use super::*;

    proptest! {
        /// Encryption followed by decryption with the same key returns original plaintext
        #[test]
        fn roundtrip_preserves_data(plaintext in plaintext_strategy(), aad in plaintext_strategy()) {
            let key = generate_random_key();

            let encrypted = encrypt(&key, &plaintext, &aad).unwrap();
            let decrypted = decrypt(&key, &encrypted, &aad).unwrap();

            prop_assert_eq!(decrypted.as_slice(), plaintext.as_slice());
        }

        /// Stored layout survives encode/decode and still opens
        #[test]
        fn sealed_bytes_open(plaintext in plaintext_strategy()) {
            let key = generate_random_key();
            let sealed = seal(&key, &plaintext, b"row").unwrap();

            prop_assert_eq!(sealed.len(), HEADER_SIZE + plaintext.len() + 16);
            let opened = open(&key, &sealed, b"row").unwrap();
            prop_assert_eq!(opened.as_slice(), plaintext.as_slice());
        }

        /// Same key encrypting same plaintext never repeats salt or nonce
        #[test]
        fn same_key_fresh_randomness(plaintext in plaintext_strategy()) {
            let key = generate_random_key();

            let e1 = encrypt(&key, &plaintext, b"").unwrap();
            let e2 = encrypt(&key, &plaintext, b"").unwrap();

            prop_assert_ne!(e1.nonce, e2.nonce);
            prop_assert_ne!(e1.salt, e2.salt);
        }
    }
}

// =============================================================================
// ISOLATION PROPERTIES
// =============================================================================

mod isolation_properties {
    use super::*;

    proptest! {
        /// A record sealed for one instance never opens under another instance's key
        #[test]
        fn other_instance_cannot_open(
            master in master_strategy(),
            a in instance_strategy(),
            b in instance_strategy(),
            plaintext in plaintext_strategy(),
        ) {
            prop_assume!(a != b);

            let key_a = master.derive_instance_key(&a).unwrap();
            let key_b = master.derive_instance_key(&b).unwrap();
            prop_assert_ne!(key_a.as_bytes(), key_b.as_bytes());

            let sealed = seal(&key_a, &plaintext, b"2026-02").unwrap();
            let result = open(&key_b, &sealed, b"2026-02");
            prop_assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
        }

        /// Instance key derivation is deterministic
        #[test]
        fn instance_key_deterministic(bytes in prop::array::uniform32(any::<u8>()), id in instance_strategy()) {
            let m1 = MasterKey::from_bytes(bytes);
            let m2 = MasterKey::from_bytes(bytes);
            let k1 = m1.derive_instance_key(&id).unwrap();
            let k2 = m2.derive_instance_key(&id).unwrap();
            prop_assert_eq!(k1.as_bytes(), k2.as_bytes());
            prop_assert_eq!(k1.as_bytes().len(), KEY_SIZE);
        }
    }
}

// =============================================================================
// TAMPER DETECTION PROPERTIES
// =============================================================================

mod tamper_properties {
    use super::*;

    proptest! {
        /// Flipping any single bit anywhere in the stored blob is detected
        #[test]
        fn any_bit_flip_detected(
            plaintext in prop::collection::vec(any::<u8>(), 1..256),
            position in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let key = generate_random_key();
            let mut sealed = seal(&key, &plaintext, b"aad").unwrap();

            let i = position.index(sealed.len());
            sealed[i] ^= 1 << bit;

            let result = open(&key, &sealed, b"aad");
            prop_assert!(matches!(result, Err(CryptoError::AuthenticationFailure)));
        }

        /// Truncating the blob is never accepted
        #[test]
        fn truncation_detected(
            plaintext in prop::collection::vec(any::<u8>(), 0..256),
            cut in 1usize..64,
        ) {
            let key = generate_random_key();
            let sealed = seal(&key, &plaintext, b"aad").unwrap();
            let keep = sealed.len().saturating_sub(cut);

            let result = open(&key, &sealed[..keep], b"aad");
            prop_assert!(result.unwrap_err().is_authentication_failure());
        }

        /// Appending bytes is never accepted
        #[test]
        fn extension_detected(
            plaintext in prop::collection::vec(any::<u8>(), 0..256),
            extra in prop::collection::vec(any::<u8>(), 1..32),
        ) {
            let key = generate_random_key();
            let mut sealed = seal(&key, &plaintext, b"aad").unwrap();
            sealed.extend_from_slice(&extra);

            let blob = EncryptedBlob::from_bytes(&sealed).unwrap();
            prop_assert!(decrypt(&key, &blob, b"aad").is_err());
        }
    }
}
