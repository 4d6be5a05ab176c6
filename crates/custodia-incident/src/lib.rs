//! # custodia-incident: Incident lifecycle for `Custodia`
//!
//! - [`risk`]: bounded, explainable risk score frozen at creation
//! - [`Incident`]: immutable facts plus a strictly linear lifecycle
//! - [`Timeline`]: append-only chain-of-custody record
//!
//! This crate is pure domain logic: no I/O, no locking. Exclusive access to
//! a single incident is the caller's job (the registry wraps each incident in
//! its own mutex so check-then-act transitions are atomic).

mod error;
mod incident;
pub mod risk;
mod timeline;

pub use error::{IncidentError, Result};
pub use incident::Incident;
pub use timeline::{Timeline, TimelineAction, TimelineEvent};
