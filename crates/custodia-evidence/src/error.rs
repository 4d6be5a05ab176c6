//! Evidence error types.

use std::path::PathBuf;

use custodia_crypto::{ContentHash, CryptoError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvidenceError {
    /// Regeneration was requested at a version that does not move forward.
    #[error("evidence version must be greater than 1 for regeneration, got {0}")]
    InvalidVersion(u32),

    #[error("invalid evidence request: {0}")]
    Validation(String),

    #[error("evidence I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize evidence: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("evidence artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("integrity mismatch for {path}: recorded {recorded}, computed {computed}")]
    IntegrityMismatch {
        path: PathBuf,
        recorded: ContentHash,
        computed: ContentHash,
    },

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl EvidenceError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    /// Like [`EvidenceError::io`], but a missing file becomes
    /// [`EvidenceError::ArtifactNotFound`].
    pub(crate) fn read(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                Self::ArtifactNotFound(path)
            } else {
                Self::Io { path, source }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EvidenceError>;
