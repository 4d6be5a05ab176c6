//! Risk scoring.
//!
//! ```text
//! risk = min(100, failed_attempts * 10 + bonus(severity))
//! bonus: HIGH = 40, MEDIUM = 25, LOW = 10
//! ```
//!
//! Pure and deterministic. The score is computed once when an incident is
//! created and frozen into it; nothing recomputes it afterwards.

use custodia_types::Severity;

/// Upper bound of the risk scale.
pub const MAX_RISK_SCORE: u8 = 100;

/// Points contributed by each failed attempt.
pub const POINTS_PER_ATTEMPT: u32 = 10;

/// Scores an incident on the bounded `[0, 100]` scale.
pub fn score(failed_attempts: u32, severity: Severity) -> u8 {
    let raw = failed_attempts
        .saturating_mul(POINTS_PER_ATTEMPT)
        .saturating_add(severity.bonus());
    let clamped = raw.min(u32::from(MAX_RISK_SCORE));

    // Postcondition: score is within the bounded scale
    debug_assert!(clamped <= u32::from(MAX_RISK_SCORE));
    clamped as u8
}
