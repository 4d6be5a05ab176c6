//! In-memory incident registry and analysis orchestration.
//!
//! # Locking
//!
//! ```text
//! RwLock<RegistryState>
//!   └─ by_id: IncidentId -> Arc<Mutex<Incident>>
//! ```
//!
//! The outer lock guards membership and ordering only; it is held briefly to
//! insert a batch or to clone out incident handles. Each incident has its own
//! mutex, held for the whole check-then-act of a transition, so two callers
//! racing on the same incident serialize while unrelated incidents proceed
//! in parallel. No code path acquires the outer lock while holding an
//! incident mutex.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use custodia_crypto::EncryptionService;
use custodia_evidence::{EvidenceSealer, EvidenceVault};
use custodia_incident::Incident;
use custodia_types::{Actor, IncidentId, IncidentStatus, Severity};
use serde::Serialize;

use crate::detect::{FailedLoginDetector, read_log_file};
use crate::error::{CustodiaError, Result};

/// Reason recorded on every incident when its evidence is decrypted.
pub const DECRYPTION_AUDIT_REASON: &str = "Forensic artifact decrypted for review";

/// An incident together with its advisory next states.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentView {
    #[serde(flatten)]
    pub incident: Incident,
    pub allowed_next_statuses: Vec<IncidentStatus>,
}

impl From<Incident> for IncidentView {
    fn from(incident: Incident) -> Self {
        let allowed_next_statuses = incident.allowed_next_statuses().to_vec();
        Self {
            incident,
            allowed_next_statuses,
        }
    }
}

/// Plaintext of a decrypted artifact and the incidents whose timelines
/// recorded the access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedEvidence {
    pub plaintext: Vec<u8>,
    pub audited: Vec<IncidentId>,
}

/// What a batch artifact records for each incident it produced.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Finding<'a> {
    id: &'a IncidentId,
    ip: &'a str,
    attempts: u32,
    severity: Severity,
    risk_score: u8,
    status: IncidentStatus,
}

#[derive(Default)]
struct RegistryState {
    by_id: HashMap<IncidentId, Arc<Mutex<Incident>>>,
    /// Insertion order, for stable listing.
    order: Vec<IncidentId>,
    last_analysis: Option<DateTime<Utc>>,
}

/// Owns every live incident for the lifetime of the process.
pub struct IncidentRegistry {
    detector: FailedLoginDetector,
    sealer: EvidenceSealer,
    vault: EvidenceVault,
    state: RwLock<RegistryState>,
}

impl std::fmt::Debug for IncidentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentRegistry")
            .field("detector", &self.detector)
            .field("sealer", &self.sealer)
            .finish_non_exhaustive()
    }
}

impl IncidentRegistry {
    /// Creates an empty registry writing evidence under `evidence_dir`.
    pub fn new(evidence_dir: impl Into<PathBuf>, cipher: Arc<dyn EncryptionService>) -> Self {
        Self {
            detector: FailedLoginDetector::default(),
            sealer: EvidenceSealer::new(evidence_dir),
            vault: EvidenceVault::new(cipher),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Replaces the default failed-login detector.
    pub fn with_detector(mut self, detector: FailedLoginDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn detector(&self) -> &FailedLoginDetector {
        &self.detector
    }

    pub fn sealer(&self) -> &EvidenceSealer {
        &self.sealer
    }

    pub fn vault(&self) -> &EvidenceVault {
        &self.vault
    }

    // ========================================================================
    // Analysis
    // ========================================================================

    /// Turns a batch of log lines into incidents sharing one encrypted artifact.
    ///
    /// Detection, sealing and encryption all complete before anything is
    /// inserted; if any step fails the registry is left untouched. Incidents
    /// are inserted under a single write lock, so readers see either none or
    /// all of the batch.
    pub fn analyze_batch<I, S>(&self, lines: I, actor: &Actor, secret: &str) -> Result<Vec<Incident>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if actor.is_blank() {
            return Err(CustodiaError::validation("actor is required for analysis"));
        }
        if secret.is_empty() {
            return Err(CustodiaError::validation(
                "an encryption secret is required for analysis",
            ));
        }

        let counts = self.detector.count_failures(lines);
        if counts.is_empty() {
            tracing::info!(%actor, "analysis found no failed authentication attempts");
            self.write_state()?.last_analysis = Some(Utc::now());
            return Ok(Vec::new());
        }

        let planned: Vec<_> = counts
            .into_iter()
            .map(|count| {
                let severity = self.detector.classify(count.failed_attempts);
                (IncidentId::generate(), count, severity)
            })
            .collect();

        let findings: Vec<_> = planned
            .iter()
            .map(|(id, count, severity)| Finding {
                id,
                ip: &count.source_ip,
                attempts: count.failed_attempts,
                severity: *severity,
                risk_score: custodia_incident::risk::score(count.failed_attempts, *severity),
                status: IncidentStatus::Open,
            })
            .collect();

        let sealed = self.sealer.seal(&findings, actor)?;
        let encrypted = self.vault.encrypt_artifact(&sealed.path, secret)?;
        // Stored resolved so every spelling of the file matches on audit
        let artifact = canonical_artifact_path(&encrypted)?;

        let incidents: Vec<Incident> = planned
            .into_iter()
            .map(|(id, count, severity)| {
                Incident::new(
                    id,
                    count.source_ip,
                    count.failed_attempts,
                    severity,
                    Some(artifact.clone()),
                )
            })
            .collect();

        {
            let mut state = self.write_state()?;
            if let Some(dup) = incidents.iter().find(|i| state.by_id.contains_key(i.id())) {
                return Err(CustodiaError::internal(format!(
                    "generated incident id {} already exists",
                    dup.id()
                )));
            }

            let before = state.by_id.len();
            for incident in &incidents {
                state.order.push(incident.id().clone());
                state
                    .by_id
                    .insert(incident.id().clone(), Arc::new(Mutex::new(incident.clone())));
            }
            state.last_analysis = Some(Utc::now());

            // Postcondition: every incident in the batch is now visible
            assert_eq!(state.by_id.len(), before + incidents.len());
            assert_eq!(state.order.len(), state.by_id.len());
        }

        tracing::info!(
            %actor,
            incidents = incidents.len(),
            artifact = %artifact.display(),
            "analysis batch committed"
        );
        Ok(incidents)
    }

    /// Reads `path` and runs [`IncidentRegistry::analyze_batch`] over its lines.
    pub fn analyze_log_file(&self, path: &Path, actor: &Actor, secret: &str) -> Result<Vec<Incident>> {
        let lines = read_log_file(path)?;
        tracing::debug!(path = %path.display(), lines = lines.len(), "read log file");
        self.analyze_batch(&lines, actor, secret)
    }

    pub fn last_analysis_time(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read_state()?.last_analysis)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns a snapshot of the incident with `id`.
    pub fn get(&self, id: &IncidentId) -> Result<Incident> {
        let handle = self.handle(id)?;
        let incident = lock(&handle)?;
        Ok(incident.clone())
    }

    pub fn view(&self, id: &IncidentId) -> Result<IncidentView> {
        self.get(id).map(IncidentView::from)
    }

    /// Snapshots of all incidents, in creation order.
    pub fn list(&self) -> Result<Vec<Incident>> {
        self.handles()?
            .iter()
            .map(|handle| lock(handle).map(|incident| incident.clone()))
            .collect()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read_state()?.order.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Applies a status transition under the incident's lock and returns the
    /// updated snapshot.
    pub fn update_status(
        &self,
        id: &IncidentId,
        new_status: IncidentStatus,
        actor: &Actor,
    ) -> Result<Incident> {
        self.mutate(id, |incident| incident.update_status(new_status, actor))
    }

    pub fn add_analyst_note(&self, id: &IncidentId, actor: &Actor, note: &str) -> Result<Incident> {
        self.mutate(id, |incident| incident.add_analyst_note(actor, note))
    }

    pub fn record_evidence_access(
        &self,
        id: &IncidentId,
        actor: &Actor,
        reason: &str,
    ) -> Result<Incident> {
        self.mutate(id, |incident| incident.record_evidence_access(actor, reason))
    }

    // ========================================================================
    // Evidence
    // ========================================================================

    /// Seals and encrypts a new version of the evidence for every current
    /// incident, timelines included. Returns the new `.enc` path.
    ///
    /// Incidents keep pointing at the artifact they were created with.
    pub fn regenerate_evidence(
        &self,
        actor: &Actor,
        version: u32,
        reason: &str,
        secret: &str,
    ) -> Result<PathBuf> {
        if actor.is_blank() {
            return Err(CustodiaError::validation(
                "actor is required to regenerate evidence",
            ));
        }
        if secret.is_empty() {
            return Err(CustodiaError::validation(
                "an encryption secret is required to regenerate evidence",
            ));
        }

        let snapshot = self.list()?;
        let sealed = self.sealer.reseal(&snapshot, actor, version, reason)?;
        let artifact = self.vault.encrypt_artifact(&sealed.path, secret)?;

        tracing::info!(
            %actor,
            version,
            incidents = snapshot.len(),
            artifact = %artifact.display(),
            "evidence regenerated"
        );
        Ok(artifact)
    }

    /// Decrypts an artifact and records the access on every incident tied to it.
    ///
    /// The requested path is resolved on disk before matching, so relative,
    /// `..` and symlinked spellings of a linked artifact are all audited. The
    /// actor must be a named user. On any failure no incident is touched.
    pub fn decrypt_and_audit(
        &self,
        artifact_path: &Path,
        secret: &str,
        actor: &Actor,
    ) -> Result<DecryptedEvidence> {
        if actor.is_system() || actor.is_blank() {
            return Err(CustodiaError::validation(
                "a named actor is required to decrypt evidence",
            ));
        }

        let path = canonical_artifact_path(artifact_path)?;
        let plaintext = match self.vault.decrypt_artifact(&path, secret) {
            Ok(plaintext) => plaintext,
            Err(err) => {
                tracing::warn!(path = %path.display(), %actor, "evidence decryption denied");
                return Err(err.into());
            }
        };

        let mut audited = Vec::new();
        for handle in self.handles()? {
            let mut incident = lock(&handle)?;
            if incident.artifact_path() == Some(path.as_path()) {
                incident.record_evidence_access(actor, DECRYPTION_AUDIT_REASON)?;
                audited.push(incident.id().clone());
            }
        }

        tracing::info!(
            path = %path.display(),
            %actor,
            audited = audited.len(),
            "evidence decrypted"
        );
        Ok(DecryptedEvidence { plaintext, audited })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn mutate<F>(&self, id: &IncidentId, op: F) -> Result<Incident>
    where
        F: FnOnce(&mut Incident) -> custodia_incident::Result<()>,
    {
        let handle = self.handle(id)?;
        let mut incident = lock(&handle)?;
        op(&mut incident)?;
        Ok(incident.clone())
    }

    fn handle(&self, id: &IncidentId) -> Result<Arc<Mutex<Incident>>> {
        self.read_state()?
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| CustodiaError::NotFound(format!("incident {id}")))
    }

    fn handles(&self) -> Result<Vec<Arc<Mutex<Incident>>>> {
        let state = self.read_state()?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.by_id.get(id).cloned())
            .collect())
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|_| CustodiaError::internal("lock poisoned"))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|_| CustodiaError::internal("lock poisoned"))
    }
}

fn lock(handle: &Mutex<Incident>) -> Result<std::sync::MutexGuard<'_, Incident>> {
    handle
        .lock()
        .map_err(|_| CustodiaError::internal("lock poisoned"))
}

/// Resolves an artifact path on disk: absolute, with `.`, `..` and symlinks
/// removed.
pub fn canonical_artifact_path(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            CustodiaError::NotFound(format!("evidence artifact {}", path.display()))
        } else {
            CustodiaError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
