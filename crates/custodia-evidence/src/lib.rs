//! # custodia-evidence: Forensic artifacts for `Custodia`
//!
//! Evidence is produced in two steps:
//!
//! 1. [`EvidenceSealer`] serializes an incident snapshot, hashes the exact
//!    bytes with SHA-256 and writes `{metadata, incidents}` to a brand-new
//!    `incident_report_<timestamp>_v<version>.json`.
//! 2. [`EvidenceVault`] encrypts that file to `<name>.enc` through an injected
//!    [`custodia_crypto::EncryptionService`].
//!
//! Neither step ever replaces an existing artifact. A new version is a new
//! file; history on disk is additive, like an incident's timeline.

mod error;
mod sealer;
mod store;
mod vault;

pub use error::{EvidenceError, Result};
pub use sealer::{
    EvidenceMetadata, EvidenceSealer, INITIAL_REASON, INITIAL_VERSION, SealedArtifact,
    artifact_file_name, verify_artifact,
};
pub use vault::{
    DECRYPTED_MARKER, ENCRYPTED_SUFFIX, EvidenceVault, decrypted_path, encrypted_path,
};
