//! # custodia-crypto: Evidence cryptography for `Custodia`
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cipher`] | Password-based authenticated encryption (Argon2id + AES-256-GCM) |
//! | [`hash`] | SHA-256 content hashes binding sealed evidence bytes |
//!
//! The sealing and registry layers only see the [`EncryptionService`] trait,
//! so the cipher is injected rather than called as a static utility.
//!
//! ```
//! use custodia_crypto::{ContentHash, EncryptionService, KdfParams, PasswordCipher};
//!
//! let cipher = PasswordCipher::new(KdfParams::insecure_fast());
//! let envelope = cipher.encrypt(b"evidence", "s3cret").unwrap();
//! assert_eq!(cipher.decrypt(&envelope, "s3cret").unwrap(), b"evidence");
//! assert!(cipher.decrypt(&envelope, "guess").is_err());
//!
//! let hash = ContentHash::of(b"evidence");
//! assert_eq!(hash.to_hex().len(), 64);
//! ```

pub mod cipher;
pub mod error;
pub mod hash;

pub use cipher::{
    EncryptionService, KdfParams, MAX_ITERATIONS, MAX_MEMORY_KIB, MAX_PARALLELISM, MIN_MEMORY_KIB,
    PasswordCipher,
};
pub use error::{CryptoError, Result};
pub use hash::{ContentHash, HASH_LENGTH};
