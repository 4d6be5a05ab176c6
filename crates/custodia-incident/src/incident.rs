//! The incident entity and its lifecycle state machine.
//!
//! # Lifecycle
//!
//! ```text
//! Open -> Investigating -> Mitigated -> Closed
//! ```
//!
//! Identity fields (`id`, `source_ip`, `failed_attempts`, `severity`,
//! `risk_score`, `artifact_path`) are set once in [`Incident::new`] and have
//! no setters. The only mutable state is `status`, changed through
//! [`Incident::update_status`], and the append-only [`Timeline`].
//!
//! Every mutating method validates fully before touching state, so a failed
//! call leaves both status and timeline exactly as they were.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use custodia_types::{Actor, IncidentId, IncidentStatus, Severity};
use serde::Serialize;

use crate::error::{IncidentError, Result};
use crate::risk;
use crate::timeline::{Timeline, TimelineAction};

/// A detected anomalous-authentication event for one source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    id: IncidentId,
    #[serde(rename = "ip")]
    source_ip: String,
    #[serde(rename = "attempts")]
    failed_attempts: u32,
    severity: Severity,
    risk_score: u8,
    status: IncidentStatus,
    artifact_path: Option<PathBuf>,
    created_at: DateTime<Utc>,
    timeline: Timeline,
}

impl Incident {
    /// Creates an incident in `Open` with its initial audit trail.
    ///
    /// The timeline starts with `INCIDENT_CREATED`, then `ARTIFACT_CREATED`
    /// when an artifact path is supplied, then `STATUS_SET`.
    pub fn new(
        id: IncidentId,
        source_ip: impl Into<String>,
        failed_attempts: u32,
        severity: Severity,
        artifact_path: Option<PathBuf>,
    ) -> Self {
        let mut incident = Self {
            id,
            source_ip: source_ip.into(),
            failed_attempts,
            severity,
            risk_score: risk::score(failed_attempts, severity),
            status: IncidentStatus::Open,
            artifact_path,
            created_at: Utc::now(),
            timeline: Timeline::new(),
        };

        incident.timeline.append(
            TimelineAction::IncidentCreated,
            Actor::System,
            "Incident detected by analysis engine",
        );
        if incident.artifact_path.is_some() {
            incident.timeline.append(
                TimelineAction::ArtifactCreated,
                Actor::System,
                "Encrypted forensic artifact generated",
            );
        }
        incident.timeline.append(
            TimelineAction::StatusSet,
            Actor::System,
            format!("Initial status set to {}", IncidentStatus::Open),
        );

        // Postcondition: complete audit trail from time zero
        debug_assert!(incident.timeline.len() >= 2);
        debug_assert_eq!(incident.status, IncidentStatus::Open);

        incident
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> &IncidentId {
        &self.id
    }

    pub fn source_ip(&self) -> &str {
        &self.source_ip
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn risk_score(&self) -> u8 {
        self.risk_score
    }

    pub fn status(&self) -> IncidentStatus {
        self.status
    }

    pub fn artifact_path(&self) -> Option<&Path> {
        self.artifact_path.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Advisory projection of the legal next states.
    ///
    /// [`Incident::update_status`] re-validates independently; this is for
    /// callers that want to render choices, not an enforcement point.
    pub fn allowed_next_statuses(&self) -> &'static [IncidentStatus] {
        self.status.allowed_next()
    }

    // ========================================================================
    // Lifecycle control
    // ========================================================================

    /// Moves the incident to `new_status`.
    ///
    /// Only the single next step from the current state is legal. On success
    /// a `STATUS_CHANGED` entry records both states.
    pub fn update_status(&mut self, new_status: IncidentStatus, actor: &Actor) -> Result<()> {
        if actor.is_blank() {
            return Err(IncidentError::Validation(
                "actor is required for a status change".to_string(),
            ));
        }

        let old_status = self.status;
        if !old_status.can_transition_to(new_status) {
            tracing::warn!(
                incident = %self.id,
                from = %old_status,
                to = %new_status,
                "rejected incident status transition"
            );
            return Err(IncidentError::InvalidTransition {
                from: old_status,
                to: new_status,
            });
        }

        self.status = new_status;
        self.timeline.append(
            TimelineAction::StatusChanged,
            actor.clone(),
            format!("Status changed from {old_status} to {new_status}"),
        );

        tracing::debug!(incident = %self.id, from = %old_status, to = %new_status, %actor, "incident status changed");
        Ok(())
    }

    /// Records a free-text analyst note. Does not change status.
    pub fn add_analyst_note(&mut self, actor: &Actor, note: &str) -> Result<()> {
        if note.trim().is_empty() {
            return Err(IncidentError::Validation(
                "analyst note cannot be empty".to_string(),
            ));
        }
        if actor.is_blank() {
            return Err(IncidentError::Validation(
                "actor is required for an analyst note".to_string(),
            ));
        }

        self.timeline
            .append(TimelineAction::AnalystNote, actor.clone(), note);
        Ok(())
    }

    /// Records that `actor` inspected this incident's evidence.
    ///
    /// Evidence access must be attributable to a named person, so
    /// [`Actor::System`] is rejected along with blank names.
    pub fn record_evidence_access(&mut self, actor: &Actor, reason: &str) -> Result<()> {
        if actor.is_system() || actor.is_blank() {
            return Err(IncidentError::Validation(
                "actor is required for evidence access logging".to_string(),
            ));
        }
        if reason.trim().is_empty() {
            return Err(IncidentError::Validation(
                "access reason is required for forensic audit".to_string(),
            ));
        }

        self.timeline
            .append(TimelineAction::EvidenceAccessed, actor.clone(), reason);
        Ok(())
    }
}
