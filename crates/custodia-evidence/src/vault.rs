//! File-level encryption of sealed artifacts.
//!
//! `incident_report_..._v1.json` encrypts to `incident_report_..._v1.json.enc`
//! next to it. Decrypting writes `incident_report_..._v1_decrypted.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use custodia_crypto::EncryptionService;

use crate::error::{EvidenceError, Result};
use crate::store;

/// Suffix appended to a sealed artifact's name once encrypted.
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// Marker inserted into the name of decrypted output.
pub const DECRYPTED_MARKER: &str = "_decrypted";

/// Encrypts and decrypts evidence files through an injected cipher.
#[derive(Clone)]
pub struct EvidenceVault {
    cipher: Arc<dyn EncryptionService>,
}

impl std::fmt::Debug for EvidenceVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceVault").finish_non_exhaustive()
    }
}

impl EvidenceVault {
    pub fn new(cipher: Arc<dyn EncryptionService>) -> Self {
        Self { cipher }
    }

    /// Encrypts the file at `sealed` into `<sealed>.enc`.
    ///
    /// The encrypted file is written beside the original, which is left in
    /// place. Fails rather than overwrite an existing `.enc` file.
    pub fn encrypt_artifact(&self, sealed: &Path, secret: &str) -> Result<PathBuf> {
        let plaintext = std::fs::read(sealed).map_err(EvidenceError::read(sealed))?;
        let ciphertext = self.cipher.encrypt(&plaintext, secret)?;

        let target = encrypted_path(sealed);
        let (dir, name) = split(&target)?;
        let path = store::persist_new(dir, &ciphertext, std::iter::once(name))?;

        tracing::info!(path = %path.display(), bytes = ciphertext.len(), "encrypted evidence artifact");
        Ok(path)
    }

    /// Decrypts the artifact at `encrypted` and returns the plaintext.
    ///
    /// A missing file is reported as [`EvidenceError::ArtifactNotFound`];
    /// every other failure to decrypt is the opaque
    /// [`custodia_crypto::CryptoError::DecryptionFailed`].
    pub fn decrypt_artifact(&self, encrypted: &Path, secret: &str) -> Result<Vec<u8>> {
        let ciphertext = std::fs::read(encrypted).map_err(EvidenceError::read(encrypted))?;

        match self.cipher.decrypt(&ciphertext, secret) {
            Ok(plaintext) => Ok(plaintext),
            Err(err) => {
                tracing::warn!(path = %encrypted.display(), "evidence decryption rejected");
                Err(err.into())
            }
        }
    }

    /// Writes decrypted `plaintext` for `encrypted` to its `_decrypted` path.
    ///
    /// Decrypted output is a working copy rather than evidence, so a previous
    /// copy is replaced.
    pub fn write_decrypted(&self, encrypted: &Path, plaintext: &[u8]) -> Result<PathBuf> {
        let target = decrypted_path(encrypted);
        store::persist_replace(&target, plaintext)?;
        Ok(target)
    }
}

/// `<sealed>.enc`
pub fn encrypted_path(sealed: &Path) -> PathBuf {
    let mut name = sealed.as_os_str().to_os_string();
    name.push(ENCRYPTED_SUFFIX);
    PathBuf::from(name)
}

/// Drops a trailing `.enc` and inserts `_decrypted` before a `.json`
/// extension (or at the end when there is none).
pub fn decrypted_path(encrypted: &Path) -> PathBuf {
    let name = encrypted
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = name.strip_suffix(ENCRYPTED_SUFFIX).unwrap_or(&name);

    let decrypted = match base.strip_suffix(".json") {
        Some(stem) => format!("{stem}{DECRYPTED_MARKER}.json"),
        None => format!("{base}{DECRYPTED_MARKER}"),
    };
    encrypted.with_file_name(decrypted)
}

fn split(path: &Path) -> Result<(&Path, String)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| EvidenceError::Validation(format!("not a file path: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, name))
}
