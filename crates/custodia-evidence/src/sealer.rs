//! Evidence sealing: snapshot, hash, wrap, persist.
//!
//! A sealed artifact is a pretty-printed JSON document:
//!
//! ```text
//! {
//!   "metadata": { "createdBy", "createdAt", "version", "reason", "integrityHash" },
//!   "incidents": <compact snapshot bytes, embedded verbatim>
//! }
//! ```
//!
//! The snapshot is serialized once to compact bytes, hashed, and then embedded
//! as a raw JSON fragment. The bytes on disk under `incidents` are therefore
//! exactly the bytes the `integrityHash` was computed over, and
//! [`verify_artifact`] can recompute it without re-serializing anything.
//!
//! Every call writes a new file named
//! `incident_report_<timestamp>_v<version>.json`; existing artifacts are never
//! replaced.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use custodia_crypto::ContentHash;
use custodia_types::Actor;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{EvidenceError, Result};
use crate::store;

/// Version of the first artifact for a batch.
pub const INITIAL_VERSION: u32 = 1;

/// Reason recorded on every initial seal.
pub const INITIAL_REASON: &str = "Initial automated analysis";

const FILE_PREFIX: &str = "incident_report_";

// Fresh timestamps tried when two seals land on the same instant.
const MAX_NAME_ATTEMPTS: usize = 8;

/// Provenance block written ahead of the sealed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceMetadata {
    pub created_by: Actor,
    pub created_at: DateTime<Utc>,
    pub version: u32,
    pub reason: String,
    pub integrity_hash: ContentHash,
}

/// A successfully persisted artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedArtifact {
    pub path: PathBuf,
    pub metadata: EvidenceMetadata,
}

#[derive(Serialize)]
struct ArtifactDocument<'a> {
    metadata: &'a EvidenceMetadata,
    incidents: &'a RawValue,
}

#[derive(Deserialize)]
struct StoredArtifact<'a> {
    metadata: EvidenceMetadata,
    #[serde(borrow)]
    incidents: &'a RawValue,
}

/// Writes sealed artifacts into a managed evidence directory.
#[derive(Debug, Clone)]
pub struct EvidenceSealer {
    directory: PathBuf,
}

impl EvidenceSealer {
    /// The directory is created lazily on the first seal.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Seals the first artifact of a batch at [`INITIAL_VERSION`].
    pub fn seal<T>(&self, incidents: &T, created_by: &Actor) -> Result<SealedArtifact>
    where
        T: Serialize + ?Sized,
    {
        self.seal_versioned(incidents, created_by, INITIAL_VERSION, INITIAL_REASON)
    }

    /// Seals a regenerated artifact.
    ///
    /// `version` must be greater than [`INITIAL_VERSION`] and `reason` must be
    /// non-blank; both are checked before anything touches the filesystem.
    pub fn reseal<T>(
        &self,
        incidents: &T,
        created_by: &Actor,
        version: u32,
        reason: &str,
    ) -> Result<SealedArtifact>
    where
        T: Serialize + ?Sized,
    {
        if version <= INITIAL_VERSION {
            return Err(EvidenceError::InvalidVersion(version));
        }
        if reason.trim().is_empty() {
            return Err(EvidenceError::Validation(
                "a reason is required to regenerate evidence".to_string(),
            ));
        }
        self.seal_versioned(incidents, created_by, version, reason)
    }

    fn seal_versioned<T>(
        &self,
        incidents: &T,
        created_by: &Actor,
        version: u32,
        reason: &str,
    ) -> Result<SealedArtifact>
    where
        T: Serialize + ?Sized,
    {
        // Hash first, over the exact bytes that get embedded.
        let snapshot = RawValue::from_string(serde_json::to_string(incidents)?)?;
        let integrity_hash = ContentHash::of(snapshot.get().as_bytes());

        let metadata = EvidenceMetadata {
            created_by: created_by.clone(),
            created_at: Utc::now(),
            version,
            reason: reason.to_string(),
            integrity_hash,
        };
        let document = serde_json::to_vec_pretty(&ArtifactDocument {
            metadata: &metadata,
            incidents: &snapshot,
        })?;

        std::fs::create_dir_all(&self.directory).map_err(EvidenceError::io(&self.directory))?;

        let first = metadata.created_at;
        let names = std::iter::once(artifact_file_name(first, version)).chain(
            std::iter::repeat_with(move || artifact_file_name(Utc::now(), version))
                .take(MAX_NAME_ATTEMPTS - 1),
        );
        let path = store::persist_new(&self.directory, &document, names)?;

        tracing::info!(
            path = %path.display(),
            version,
            hash = %integrity_hash,
            created_by = %created_by,
            "sealed evidence artifact"
        );

        Ok(SealedArtifact { path, metadata })
    }
}

/// File name for an artifact sealed at `at`.
///
/// Nanosecond resolution keeps names distinct across rapid successive seals;
/// the version suffix keeps regenerations apart from initial seals.
pub fn artifact_file_name(at: DateTime<Utc>, version: u32) -> String {
    format!(
        "{FILE_PREFIX}{}_v{version}.json",
        at.format("%Y-%m-%d_%H-%M-%S_%f")
    )
}

/// Re-reads a sealed artifact and checks its recorded integrity hash.
///
/// Returns the artifact's metadata when the embedded snapshot still hashes to
/// the recorded value.
pub fn verify_artifact(path: &Path) -> Result<EvidenceMetadata> {
    let text = std::fs::read_to_string(path).map_err(EvidenceError::read(path))?;
    let stored: StoredArtifact<'_> = serde_json::from_str(&text)?;

    let computed = ContentHash::of(stored.incidents.get().as_bytes());
    if computed != stored.metadata.integrity_hash {
        tracing::warn!(path = %path.display(), "evidence integrity check failed");
        return Err(EvidenceError::IntegrityMismatch {
            path: path.to_path_buf(),
            recorded: stored.metadata.integrity_hash,
            computed,
        });
    }

    Ok(stored.metadata)
}
