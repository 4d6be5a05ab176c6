//! # custodia-types: Core types for `Custodia`
//!
//! This crate contains the closed vocabularies shared across the `Custodia`
//! incident and evidence crates:
//! - Identity ([`IncidentId`])
//! - Classification ([`Severity`])
//! - Lifecycle ([`IncidentStatus`])
//! - Attribution ([`Actor`])
//!
//! Everything here is validated at construction. String labels coming from
//! collaborators (API payloads, CLI flags, log heuristics) are parsed through
//! [`FromStr`] and never stored raw.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("{0} is required")]
    BlankIdentifier(&'static str),

    #[error("unknown severity: {0}")]
    UnknownSeverity(String),

    #[error("unknown incident status: {0}")]
    UnknownStatus(String),
}

pub type Result<T> = std::result::Result<T, TypeError>;

// ============================================================================
// Incident ID - Clone (owned string, assigned once)
// ============================================================================

/// Unique identifier for an incident.
///
/// Never blank. Assigned when the incident is created and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IncidentId(String);

impl IncidentId {
    /// Wraps an existing identifier, rejecting blank input.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::BlankIdentifier("incident id"));
        }
        Ok(Self(id))
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IncidentId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for IncidentId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<IncidentId> for String {
    fn from(id: IncidentId) -> Self {
        id.0
    }
}

// ============================================================================
// Severity - Copy (closed classification)
// ============================================================================

/// Coarse classification of failed-attempt volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    /// Risk-score bonus contributed by this severity.
    pub fn bonus(self) -> u32 {
        match self {
            Severity::Low => 10,
            Severity::Medium => 25,
            Severity::High => 40,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            _ => Err(TypeError::UnknownSeverity(s.to_string())),
        }
    }
}

// ============================================================================
// Incident Status - Copy (linear lifecycle)
// ============================================================================

/// Lifecycle state of an incident.
///
/// ```text
/// Open -> Investigating -> Mitigated -> Closed
/// ```
///
/// Strictly linear: no skipping, no back-transitions, `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Mitigated,
    Closed,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 4] = [
        IncidentStatus::Open,
        IncidentStatus::Investigating,
        IncidentStatus::Mitigated,
        IncidentStatus::Closed,
    ];

    /// The single legal successor, or `None` for `Closed`.
    pub fn next(self) -> Option<Self> {
        match self {
            IncidentStatus::Open => Some(IncidentStatus::Investigating),
            IncidentStatus::Investigating => Some(IncidentStatus::Mitigated),
            IncidentStatus::Mitigated => Some(IncidentStatus::Closed),
            IncidentStatus::Closed => None,
        }
    }

    /// Returns true if `to` is exactly the next step from `self`.
    pub fn can_transition_to(self, to: Self) -> bool {
        self.next() == Some(to)
    }

    /// Advisory projection of the transition table.
    pub fn allowed_next(self) -> &'static [IncidentStatus] {
        match self {
            IncidentStatus::Open => &[IncidentStatus::Investigating],
            IncidentStatus::Investigating => &[IncidentStatus::Mitigated],
            IncidentStatus::Mitigated => &[IncidentStatus::Closed],
            IncidentStatus::Closed => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Open => "OPEN",
            IncidentStatus::Investigating => "INVESTIGATING",
            IncidentStatus::Mitigated => "MITIGATED",
            IncidentStatus::Closed => "CLOSED",
        }
    }
}

impl Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(IncidentStatus::Open),
            "INVESTIGATING" => Ok(IncidentStatus::Investigating),
            "MITIGATED" => Ok(IncidentStatus::Mitigated),
            "CLOSED" => Ok(IncidentStatus::Closed),
            _ => Err(TypeError::UnknownStatus(s.to_string())),
        }
    }
}

// ============================================================================
// Actor - Clone (who performed an action)
// ============================================================================

/// Who performed an audited action.
///
/// Serializes as `null` for [`Actor::System`] and as the bare name for
/// [`Actor::User`], so exported timelines keep the "absent means system"
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Actor {
    System,
    User(String),
}

impl Actor {
    pub fn user(name: impl Into<String>) -> Self {
        Actor::User(name.into())
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }

    /// The user name, if this is a named actor.
    pub fn name(&self) -> Option<&str> {
        match self {
            Actor::System => None,
            Actor::User(name) => Some(name),
        }
    }

    /// A named actor whose name is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Actor::System => false,
            Actor::User(name) => name.trim().is_empty(),
        }
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::System => f.write_str("system"),
            Actor::User(name) => f.write_str(name),
        }
    }
}

impl Serialize for Actor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Actor::System => serializer.serialize_none(),
            Actor::User(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for Actor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(name.map_or(Actor::System, Actor::User))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn blank_incident_id_is_rejected() {
        assert_eq!(
            IncidentId::new("   "),
            Err(TypeError::BlankIdentifier("incident id"))
        );
        assert!(IncidentId::new("").is_err());
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = IncidentId::generate();
        let b = IncidentId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn incident_id_deserialize_rejects_blank() {
        let result: std::result::Result<IncidentId, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());

        let id: IncidentId = serde_json::from_str("\"inc-1\"").unwrap();
        assert_eq!(id.as_str(), "inc-1");
    }

    #[test_case(Severity::Low, 10)]
    #[test_case(Severity::Medium, 25)]
    #[test_case(Severity::High, 40)]
    fn severity_bonus(severity: Severity, expected: u32) {
        assert_eq!(severity.bonus(), expected);
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!("high".parse::<Severity>(), Ok(Severity::High));
        assert_eq!(" Medium ".parse::<Severity>(), Ok(Severity::Medium));
        assert!("CRITICAL".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
    }

    #[test_case(IncidentStatus::Open, Some(IncidentStatus::Investigating))]
    #[test_case(IncidentStatus::Investigating, Some(IncidentStatus::Mitigated))]
    #[test_case(IncidentStatus::Mitigated, Some(IncidentStatus::Closed))]
    #[test_case(IncidentStatus::Closed, None)]
    fn status_next(from: IncidentStatus, expected: Option<IncidentStatus>) {
        assert_eq!(from.next(), expected);
    }

    #[test]
    fn only_the_next_step_is_legal() {
        for from in IncidentStatus::ALL {
            for to in IncidentStatus::ALL {
                assert_eq!(from.can_transition_to(to), from.next() == Some(to));
            }
        }
        assert!(!IncidentStatus::Open.can_transition_to(IncidentStatus::Closed));
        assert!(!IncidentStatus::Closed.can_transition_to(IncidentStatus::Open));
    }

    #[test]
    fn closed_has_no_allowed_next() {
        assert!(IncidentStatus::Closed.allowed_next().is_empty());
        assert!(IncidentStatus::Closed.is_terminal());
        assert_eq!(
            IncidentStatus::Open.allowed_next(),
            &[IncidentStatus::Investigating]
        );
    }

    #[test]
    fn status_round_trips_through_labels() {
        for status in IncidentStatus::ALL {
            assert_eq!(status.as_str().parse::<IncidentStatus>(), Ok(status));
        }
        assert!("REOPENED".parse::<IncidentStatus>().is_err());
    }

    #[test]
    fn actor_serializes_system_as_null() {
        assert_eq!(serde_json::to_string(&Actor::System).unwrap(), "null");
        assert_eq!(
            serde_json::to_string(&Actor::user("alice")).unwrap(),
            "\"alice\""
        );

        let actor: Actor = serde_json::from_str("null").unwrap();
        assert_eq!(actor, Actor::System);
    }

    #[test]
    fn blank_user_is_detected() {
        assert!(Actor::user("  ").is_blank());
        assert!(!Actor::user("bob").is_blank());
        assert!(!Actor::System.is_blank());
        assert_eq!(Actor::System.to_string(), "system");
        assert_eq!(Actor::user("bob").name(), Some("bob"));
    }
}
