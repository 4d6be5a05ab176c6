//! Error taxonomy surfaced by the registry.
//!
//! Every lower-layer error folds into one of these kinds so callers (an HTTP
//! layer, the CLI) can map them to responses without knowing which crate
//! produced them.

use std::path::PathBuf;

use custodia_crypto::CryptoError;
use custodia_evidence::EvidenceError;
use custodia_incident::IncidentError;
use custodia_types::{IncidentStatus, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustodiaError {
    /// A required field was blank or out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested lifecycle transition is not the single legal next step.
    #[error("illegal status transition from {from} to {to}")]
    State {
        from: IncidentStatus,
        to: IncidentStatus,
    },

    #[error("not found: {0}")]
    NotFound(String),

    /// Decryption or integrity verification failed.
    #[error("security check failed: {0}")]
    Security(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CustodiaError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<TypeError> for CustodiaError {
    fn from(err: TypeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<IncidentError> for CustodiaError {
    fn from(err: IncidentError) -> Self {
        match err {
            IncidentError::Validation(msg) => Self::Validation(msg),
            IncidentError::InvalidTransition { from, to } => Self::State { from, to },
        }
    }
}

impl From<CryptoError> for CustodiaError {
    fn from(err: CryptoError) -> Self {
        Self::Security(err.to_string())
    }
}

impl From<EvidenceError> for CustodiaError {
    fn from(err: EvidenceError) -> Self {
        match err {
            EvidenceError::InvalidVersion(_) | EvidenceError::Validation(_) => {
                Self::Validation(err.to_string())
            }
            EvidenceError::Io { path, source } => Self::Io { path, source },
            EvidenceError::Serialization(source) => Self::Serialization(source),
            EvidenceError::ArtifactNotFound(path) => {
                Self::NotFound(format!("evidence artifact {}", path.display()))
            }
            EvidenceError::IntegrityMismatch { .. } => Self::Security(err.to_string()),
            EvidenceError::Crypto(source) => source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CustodiaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_becomes_state() {
        let err: CustodiaError = IncidentError::InvalidTransition {
            from: IncidentStatus::Open,
            to: IncidentStatus::Closed,
        }
        .into();
        assert!(matches!(
            err,
            CustodiaError::State {
                from: IncidentStatus::Open,
                to: IncidentStatus::Closed
            }
        ));
    }

    #[test]
    fn decryption_failure_is_security() {
        let err: CustodiaError = EvidenceError::Crypto(CryptoError::DecryptionFailed).into();
        assert!(matches!(err, CustodiaError::Security(_)));
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let err: CustodiaError = EvidenceError::ArtifactNotFound("a.enc".into()).into();
        assert!(matches!(err, CustodiaError::NotFound(_)));
    }

    #[test]
    fn bad_version_is_validation() {
        let err: CustodiaError = EvidenceError::InvalidVersion(1).into();
        assert!(matches!(err, CustodiaError::Validation(_)));
    }
}
