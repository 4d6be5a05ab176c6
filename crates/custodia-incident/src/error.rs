use custodia_types::{IncidentStatus, TypeError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncidentError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid incident status transition: {from} -> {to}")]
    InvalidTransition {
        from: IncidentStatus,
        to: IncidentStatus,
    },
}

impl From<TypeError> for IncidentError {
    fn from(err: TypeError) -> Self {
        IncidentError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IncidentError>;
