//! Configuration management for Custodia
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (CUSTODIA_* prefix)
//! 3. custodia.local.toml (gitignored, local overrides)
//! 4. custodia.toml (git-tracked, project config)
//! 5. ~/.config/custodia/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Evidence directory used when nothing else is configured.
pub const DEFAULT_EVIDENCE_DIR: &str = "reports";

/// Main Custodia configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodiaConfig {
    pub evidence: EvidenceConfig,
    pub detection: DetectionConfig,
    pub crypto: CryptoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Where sealed and encrypted artifacts are written.
    pub directory: PathBuf,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_EVIDENCE_DIR),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Substring marking a failed authentication line.
    pub failure_marker: String,
    pub high_threshold: u32,
    pub medium_threshold: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            failure_marker: "Failed password".to_string(),
            high_threshold: 5,
            medium_threshold: 3,
        }
    }
}

/// Argon2id costs for newly encrypted artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    pub kdf_memory_kib: u32,
    pub kdf_iterations: u32,
    pub kdf_parallelism: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            kdf_memory_kib: 19_456,
            kdf_iterations: 2,
            kdf_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CustodiaConfig {
    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.evidence.directory.is_relative() {
            self.evidence.directory = base.join(&self.evidence.directory);
        }
    }

    /// Check cross-field constraints the type system cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let detection = &self.detection;
        if detection.failure_marker.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "detection.failure_marker must not be empty".to_string(),
            ));
        }
        if detection.medium_threshold == 0 || detection.high_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "detection thresholds must be at least 1".to_string(),
            ));
        }
        if detection.medium_threshold > detection.high_threshold {
            return Err(ConfigError::ValidationError(format!(
                "detection.medium_threshold ({}) exceeds detection.high_threshold ({})",
                detection.medium_threshold, detection.high_threshold
            )));
        }

        let crypto = &self.crypto;
        if crypto.kdf_iterations == 0 || crypto.kdf_parallelism == 0 {
            return Err(ConfigError::ValidationError(
                "crypto.kdf_iterations and crypto.kdf_parallelism must be at least 1".to_string(),
            ));
        }
        // Argon2 needs at least 8 KiB per lane
        if crypto.kdf_memory_kib < crypto.kdf_parallelism.saturating_mul(8) {
            return Err(ConfigError::ValidationError(format!(
                "crypto.kdf_memory_kib must be at least {} for {} lane(s)",
                crypto.kdf_parallelism.saturating_mul(8),
                crypto.kdf_parallelism
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.level must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CustodiaConfig::default();
        assert_eq!(config.evidence.directory, PathBuf::from("reports"));
        assert_eq!(config.detection.high_threshold, 5);
        assert_eq!(config.detection.medium_threshold, 3);
        assert_eq!(config.crypto.kdf_parallelism, 1);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_path_resolution() {
        let mut config = CustodiaConfig::default();
        config.resolve_paths("/srv/case-42");

        assert_eq!(
            config.evidence.directory,
            PathBuf::from("/srv/case-42/reports")
        );
    }

    #[test]
    fn test_absolute_paths_untouched() {
        let mut config = CustodiaConfig::default();
        config.evidence.directory = PathBuf::from("/var/evidence");
        config.resolve_paths("/srv/case-42");

        assert_eq!(config.evidence.directory, PathBuf::from("/var/evidence"));
    }

    #[test]
    fn test_validate_thresholds() {
        let mut config = CustodiaConfig::default();
        config.detection.medium_threshold = 6;
        assert!(config.validate().is_err());

        config.detection.medium_threshold = 0;
        assert!(config.validate().is_err());

        config.detection.medium_threshold = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_kdf() {
        let mut config = CustodiaConfig::default();
        config.crypto.kdf_parallelism = 4;
        config.crypto.kdf_memory_kib = 16;
        assert!(config.validate().is_err());

        config.crypto.kdf_memory_kib = 32;
        assert!(config.validate().is_ok());

        config.crypto.kdf_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrips_through_toml() {
        let config = CustodiaConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[detection]"));

        let parsed: CustodiaConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.detection.failure_marker, "Failed password");
    }
}
