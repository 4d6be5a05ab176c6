//! Append-only audit timeline.
//!
//! The timeline is the chain-of-custody record of an incident: every state
//! change, analyst note and evidence access lands here exactly once. The type
//! exposes no edit or removal API; the only mutation is a crate-private
//! append, so the length is monotonically non-decreasing by construction.

use chrono::{DateTime, Utc};
use custodia_types::Actor;
use serde::{Deserialize, Serialize};

/// What happened to an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineAction {
    IncidentCreated,
    ArtifactCreated,
    StatusSet,
    StatusChanged,
    AnalystNote,
    EvidenceAccessed,
}

impl TimelineAction {
    pub fn as_str(self) -> &'static str {
        match self {
            TimelineAction::IncidentCreated => "INCIDENT_CREATED",
            TimelineAction::ArtifactCreated => "ARTIFACT_CREATED",
            TimelineAction::StatusSet => "STATUS_SET",
            TimelineAction::StatusChanged => "STATUS_CHANGED",
            TimelineAction::AnalystNote => "ANALYST_NOTE",
            TimelineAction::EvidenceAccessed => "EVIDENCE_ACCESSED",
        }
    }
}

impl std::fmt::Display for TimelineAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timeline entry. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub action: TimelineAction,
    /// `null` when the system performed the action.
    pub actor: Actor,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

/// Ordered, append-only sequence of [`TimelineEvent`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
}

impl Timeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends an entry stamped with the current time.
    pub(crate) fn append(&mut self, action: TimelineAction, actor: Actor, note: impl Into<String>) {
        let len_before = self.events.len();

        self.events.push(TimelineEvent {
            action,
            actor,
            note: note.into(),
            timestamp: Utc::now(),
        });

        // Post-condition: exactly one entry was added
        assert_eq!(
            self.events.len(),
            len_before + 1,
            "timeline append must increase length by exactly 1"
        );
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimelineEvent> {
        self.events.iter()
    }

    pub fn last(&self) -> Option<&TimelineEvent> {
        self.events.last()
    }

    /// Number of entries recorded for `action`.
    pub fn count(&self, action: TimelineAction) -> usize {
        self.events.iter().filter(|e| e.action == action).count()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a TimelineEvent;
    type IntoIter = std::slice::Iter<'a, TimelineEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order() {
        let mut timeline = Timeline::new();
        timeline.append(TimelineAction::IncidentCreated, Actor::System, "created");
        timeline.append(TimelineAction::AnalystNote, Actor::user("alice"), "looked");

        let actions: Vec<_> = timeline.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![TimelineAction::IncidentCreated, TimelineAction::AnalystNote]
        );
        assert!(timeline.events()[0].timestamp <= timeline.events()[1].timestamp);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut timeline = Timeline::new();
        timeline.append(TimelineAction::StatusSet, Actor::System, "Initial status set to OPEN");

        let json = serde_json::to_value(&timeline).unwrap();
        let entry = &json.as_array().unwrap()[0];
        assert_eq!(entry["action"], "STATUS_SET");
        assert!(entry["actor"].is_null());
        assert_eq!(entry["note"], "Initial status set to OPEN");
    }

    #[test]
    fn count_by_action() {
        let mut timeline = Timeline::new();
        timeline.append(TimelineAction::AnalystNote, Actor::user("a"), "1");
        timeline.append(TimelineAction::AnalystNote, Actor::user("b"), "2");
        timeline.append(TimelineAction::EvidenceAccessed, Actor::user("a"), "3");

        assert_eq!(timeline.count(TimelineAction::AnalystNote), 2);
        assert_eq!(timeline.count(TimelineAction::StatusChanged), 0);
    }
}
