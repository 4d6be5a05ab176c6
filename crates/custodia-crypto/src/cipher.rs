//! Password-based authenticated encryption for evidence artifacts.
//!
//! Each artifact is sealed under a fresh key derived from the human-supplied
//! secret with Argon2id and a random per-artifact salt, then encrypted with
//! AES-256-GCM under a random nonce.
//!
//! # Envelope
//!
//! ```text
//! +-------+---------+--------+--------+--------+----------+-----------+------------------+
//! | magic | version | m_cost | t_cost | p_cost | salt(16) | nonce(12) | ciphertext + tag |
//! | CSTD  |   u8    | u32 LE | u32 LE | u32 LE |          |           |                  |
//! +-------+---------+--------+--------+--------+----------+-----------+------------------+
//! ```
//!
//! The header (everything before the ciphertext) is bound as associated data,
//! so tampering with the KDF parameters or salt fails authentication exactly
//! like tampering with the ciphertext does.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{CryptoError, Result};

const MAGIC: &[u8; 4] = b"CSTD";
const FORMAT_VERSION: u8 = 1;
const SALT_LENGTH: usize = 16;
const NONCE_LENGTH: usize = 12;
const KEY_LENGTH: usize = 32;
const HEADER_LENGTH: usize = MAGIC.len() + 1 + 12 + SALT_LENGTH + NONCE_LENGTH;

/// Minimum Argon2 memory cost accepted, in KiB.
pub const MIN_MEMORY_KIB: u32 = 8;

/// Upper bounds on KDF costs, enforced when encrypting and again on costs
/// read back from an envelope header.
pub const MAX_MEMORY_KIB: u32 = 1 << 20;
pub const MAX_ITERATIONS: u32 = 64;
pub const MAX_PARALLELISM: u32 = 16;

// -----------------------------------------------------------------------------
// Service contract
// -----------------------------------------------------------------------------

/// Opaque encrypt/decrypt over a human-supplied secret.
///
/// Callers hand over whole-file buffers. Implementations must fail decryption
/// with the single [`CryptoError::DecryptionFailed`] variant regardless of
/// cause.
pub trait EncryptionService: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], secret: &str) -> Result<Vec<u8>>;

    fn decrypt(&self, ciphertext: &[u8], secret: &str) -> Result<Vec<u8>>;
}

// -----------------------------------------------------------------------------
// Key derivation parameters
// -----------------------------------------------------------------------------

/// Argon2id cost parameters.
///
/// Persisted in every envelope so an artifact stays decryptable after the
/// configured defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl KdfParams {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Self {
            memory_kib,
            iterations,
            parallelism,
        };
        if memory_kib > MAX_MEMORY_KIB || iterations > MAX_ITERATIONS || parallelism > MAX_PARALLELISM
        {
            return Err(CryptoError::KeyDerivation(format!(
                "costs exceed limits (memory <= {MAX_MEMORY_KIB} KiB, iterations <= {MAX_ITERATIONS}, parallelism <= {MAX_PARALLELISM})"
            )));
        }
        params.to_argon2()?;
        Ok(params)
    }

    /// Cheap parameters for tests. Never use for real evidence.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: MIN_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        }
    }

    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    fn to_argon2(self) -> Result<Params> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LENGTH),
        )
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
    }
}

impl Default for KdfParams {
    /// OWASP-recommended Argon2id baseline: 19 MiB, 2 passes, 1 lane.
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

// -----------------------------------------------------------------------------
// PasswordCipher
// -----------------------------------------------------------------------------

/// Argon2id + AES-256-GCM implementation of [`EncryptionService`].
#[derive(Debug, Clone, Default)]
pub struct PasswordCipher {
    params: KdfParams,
}

impl PasswordCipher {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    fn derive_key(
        params: KdfParams,
        secret: &str,
        salt: &[u8],
    ) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);
        let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
        argon2
            .hash_password_into(secret.as_bytes(), salt, key.as_mut_slice())
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(key)
    }

    fn encode_header(
        params: KdfParams,
        salt: &[u8; SALT_LENGTH],
        nonce: &[u8; NONCE_LENGTH],
    ) -> Vec<u8> {
        let mut header = Vec::with_capacity(HEADER_LENGTH);
        header.extend_from_slice(MAGIC);
        header.push(FORMAT_VERSION);
        header.extend_from_slice(&params.memory_kib.to_le_bytes());
        header.extend_from_slice(&params.iterations.to_le_bytes());
        header.extend_from_slice(&params.parallelism.to_le_bytes());
        header.extend_from_slice(salt);
        header.extend_from_slice(nonce);

        // Postcondition: header layout is fixed-size
        debug_assert_eq!(header.len(), HEADER_LENGTH);
        header
    }

    fn decode_header(envelope: &[u8]) -> Option<ParsedHeader<'_>> {
        let header = envelope.get(..HEADER_LENGTH)?;
        if &header[..4] != MAGIC || header[4] != FORMAT_VERSION {
            return None;
        }

        let word = |at: usize| -> Option<u32> {
            let bytes: [u8; 4] = header.get(at..at + 4)?.try_into().ok()?;
            Some(u32::from_le_bytes(bytes))
        };
        let params = KdfParams {
            memory_kib: word(5)?,
            iterations: word(9)?,
            parallelism: word(13)?,
        };
        if params.memory_kib > MAX_MEMORY_KIB
            || params.iterations > MAX_ITERATIONS
            || params.parallelism > MAX_PARALLELISM
        {
            return None;
        }

        let salt_start = 17;
        let nonce_start = salt_start + SALT_LENGTH;
        Some(ParsedHeader {
            header,
            params,
            salt: &header[salt_start..nonce_start],
            nonce: &header[nonce_start..HEADER_LENGTH],
            ciphertext: &envelope[HEADER_LENGTH..],
        })
    }
}

struct ParsedHeader<'a> {
    header: &'a [u8],
    params: KdfParams,
    salt: &'a [u8],
    nonce: &'a [u8],
    ciphertext: &'a [u8],
}

impl EncryptionService for PasswordCipher {
    fn encrypt(&self, plaintext: &[u8], secret: &str) -> Result<Vec<u8>> {
        if secret.is_empty() {
            return Err(CryptoError::EncryptionFailed(
                "secret must not be empty".to_string(),
            ));
        }

        let mut salt = [0u8; SALT_LENGTH];
        let mut nonce = [0u8; NONCE_LENGTH];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let key = Self::derive_key(self.params, secret, &salt)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut envelope = Self::encode_header(self.params, &salt, &nonce);
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &envelope,
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        envelope.extend_from_slice(&ciphertext);
        Ok(envelope)
    }

    fn decrypt(&self, envelope: &[u8], secret: &str) -> Result<Vec<u8>> {
        let Some(parsed) = Self::decode_header(envelope) else {
            tracing::debug!(len = envelope.len(), "rejecting envelope with malformed header");
            return Err(CryptoError::DecryptionFailed);
        };

        let key = Self::derive_key(parsed.params, secret, parsed.salt).map_err(|e| {
            tracing::debug!(error = %e, "rejecting envelope with unusable KDF parameters");
            CryptoError::DecryptionFailed
        })?;
        let cipher =
            Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| CryptoError::DecryptionFailed)?;

        cipher
            .decrypt(
                Nonce::from_slice(parsed.nonce),
                Payload {
                    msg: parsed.ciphertext,
                    aad: parsed.header,
                },
            )
            .map_err(|_| {
                tracing::debug!("envelope failed authentication");
                CryptoError::DecryptionFailed
            })
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cipher() -> PasswordCipher {
        PasswordCipher::new(KdfParams::insecure_fast())
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let cipher = cipher();
        let plaintext = br#"{"metadata":{},"incidents":[]}"#;

        let envelope = cipher.encrypt(plaintext, "correct horse").unwrap();
        let decrypted = cipher.decrypt(&envelope, "correct horse").unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let cipher = cipher();
        let a = cipher.encrypt(b"evidence", "secret").unwrap();
        let b = cipher.encrypt(b"evidence", "secret").unwrap();

        // Fresh salt and nonce per artifact
        assert_ne!(a, b);
        assert_ne!(a[17..HEADER_LENGTH], b[17..HEADER_LENGTH]);
    }

    #[test]
    fn wrong_secret_fails() {
        let cipher = cipher();
        let envelope = cipher.encrypt(b"evidence", "right").unwrap();

        let result = cipher.decrypt(&envelope, "wrong");
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cipher = cipher();
        let mut envelope = cipher.encrypt(b"evidence", "secret").unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0x01;

        assert!(matches!(
            cipher.decrypt(&envelope, "secret"),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn tampered_header_fails() {
        let cipher = cipher();
        let mut envelope = cipher.encrypt(b"evidence", "secret").unwrap();
        envelope[20] ^= 0xFF; // inside the salt

        assert!(matches!(
            cipher.decrypt(&envelope, "secret"),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn truncated_and_foreign_input_fail() {
        let cipher = cipher();
        assert!(matches!(
            cipher.decrypt(b"CSTD", "secret"),
            Err(CryptoError::DecryptionFailed)
        ));
        assert!(matches!(
            cipher.decrypt(&[0u8; 128], "secret"),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn params_travel_with_the_envelope() {
        let writer = PasswordCipher::new(KdfParams::new(16, 1, 1).unwrap());
        let reader = PasswordCipher::new(KdfParams::insecure_fast());

        let envelope = writer.encrypt(b"evidence", "secret").unwrap();
        assert_eq!(reader.decrypt(&envelope, "secret").unwrap(), b"evidence");
    }

    #[test]
    fn empty_secret_is_rejected_on_encrypt() {
        assert!(matches!(
            cipher().encrypt(b"evidence", ""),
            Err(CryptoError::EncryptionFailed(_))
        ));
    }

    #[test]
    fn invalid_kdf_params_are_rejected() {
        assert!(matches!(
            KdfParams::new(0, 1, 1),
            Err(CryptoError::KeyDerivation(_))
        ));
        assert!(KdfParams::new(19_456, 2, 1).is_ok());
    }

    #[test]
    fn oversized_kdf_params_are_rejected() {
        // Would encrypt, but the reader refuses such headers
        assert!(KdfParams::new(MAX_MEMORY_KIB + 1, 1, 1).is_err());
        assert!(KdfParams::new(19_456, MAX_ITERATIONS + 1, 1).is_err());
        assert!(KdfParams::new(19_456, 1, MAX_PARALLELISM + 1).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..512),
                          secret in "[a-zA-Z0-9]{1,24}") {
            let cipher = cipher();
            let envelope = cipher.encrypt(&plaintext, &secret).unwrap();
            prop_assert_eq!(cipher.decrypt(&envelope, &secret).unwrap(), plaintext);
        }
    }
}
