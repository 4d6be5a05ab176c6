//! CLI command implementations.

pub mod analyze;
pub mod config;
pub mod decrypt;
pub mod verify;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use custodia::{
    FailedLoginDetector, IncidentRegistry, KdfParams, PasswordCipher, SeverityThresholds,
};
use custodia_config::CustodiaConfig;

/// Builds a registry wired from the project's configuration.
pub fn registry(project: &Path) -> Result<IncidentRegistry> {
    let config = CustodiaConfig::load_from_dir(project).context("Failed to load configuration")?;
    registry_from(&config)
}

pub fn registry_from(config: &CustodiaConfig) -> Result<IncidentRegistry> {
    let params = KdfParams::new(
        config.crypto.kdf_memory_kib,
        config.crypto.kdf_iterations,
        config.crypto.kdf_parallelism,
    )
    .context("Invalid [crypto] key derivation settings")?;

    let detector = FailedLoginDetector::new(
        config.detection.failure_marker.clone(),
        SeverityThresholds {
            high: config.detection.high_threshold,
            medium: config.detection.medium_threshold,
        },
    );

    Ok(IncidentRegistry::new(
        config.evidence.directory.clone(),
        Arc::new(PasswordCipher::new(params)),
    )
    .with_detector(detector))
}

/// Uses the supplied secret or prompts for one without echo.
pub fn resolve_secret(secret: Option<String>, confirm: bool) -> Result<String> {
    if let Some(secret) = secret {
        return Ok(secret);
    }

    let mut prompt = dialoguer::Password::new().with_prompt("Evidence secret");
    if confirm {
        prompt = prompt.with_confirmation("Repeat secret", "Secrets do not match");
    }
    prompt.interact().context("Failed to read secret")
}
