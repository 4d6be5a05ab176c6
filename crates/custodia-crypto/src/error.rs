//! Error types for the crypto crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Decryption failed.
    ///
    /// Deliberately carries no cause: a wrong secret, a truncated header and
    /// a tampered ciphertext are indistinguishable to the caller.
    #[error("decryption failed: wrong secret or corrupted artifact")]
    DecryptionFailed,

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("invalid key derivation parameters: {0}")]
    KeyDerivation(String),

    #[error("malformed content hash: {0}")]
    MalformedHash(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
