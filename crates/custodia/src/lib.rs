//! # Custodia
//!
//! Incident tracking with tamper-evident forensic evidence.
//!
//! Custodia turns authentication logs into incidents with a strict lifecycle
//! and an append-only audit timeline, and produces evidence that is:
//!
//! - **Integrity-bound** - a SHA-256 hash over the exact snapshot bytes
//! - **Versioned** - regenerations carry a strictly higher version
//! - **Additive** - every seal is a new file; nothing is overwritten
//! - **Encrypted** - Argon2id-derived keys with AES-256-GCM
//!
//! # Architecture
//!
//! ```text
//! log lines ─► FailedLoginDetector ─► EvidenceSealer ─► EvidenceVault
//!                                                          │ (.enc path)
//!                                                          ▼
//!                                IncidentRegistry ◄── Incident::new
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use custodia::{Actor, IncidentRegistry, IncidentStatus, KdfParams, PasswordCipher};
//!
//! # fn main() -> custodia::Result<()> {
//! let registry = IncidentRegistry::new(
//!     "reports",
//!     Arc::new(PasswordCipher::new(KdfParams::default())),
//! );
//! let alice = Actor::user("alice");
//!
//! let incidents = registry.analyze_batch(
//!     ["sshd[1]: Failed password for root from 10.0.0.1 port 22"],
//!     &alice,
//!     "case-secret",
//! )?;
//! registry.update_status(incidents[0].id(), IncidentStatus::Investigating, &alice)?;
//! # Ok(())
//! # }
//! ```

mod detect;
mod error;
mod registry;

pub use detect::{
    AttemptCount, DEFAULT_FAILURE_MARKER, FailedLoginDetector, SeverityThresholds, UNKNOWN_SOURCE,
    read_log_file,
};
pub use error::{CustodiaError, Result};
pub use registry::{
    DECRYPTION_AUDIT_REASON, DecryptedEvidence, IncidentRegistry, IncidentView,
    canonical_artifact_path,
};

// Re-export the domain types callers need alongside the registry
pub use custodia_crypto::{ContentHash, CryptoError, EncryptionService, KdfParams, PasswordCipher};
pub use custodia_evidence::{
    EvidenceMetadata, EvidenceSealer, EvidenceVault, SealedArtifact, decrypted_path,
    encrypted_path, verify_artifact,
};
pub use custodia_incident::{Incident, Timeline, TimelineAction, TimelineEvent, risk};
pub use custodia_types::{Actor, IncidentId, IncidentStatus, Severity};
