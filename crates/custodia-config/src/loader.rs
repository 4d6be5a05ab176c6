//! Configuration loader with multi-source merging

use crate::{CustodiaConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Prefix of environment overrides (`CUSTODIA_<SECTION>__<KEY>`).
const ENV_PREFIX: &str = "CUSTODIA";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<CustodiaConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = CustodiaConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/custodia/config.toml)
        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        // 3. Project config (custodia.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (custodia.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (CUSTODIA_SECTION__KEY); keys contain
        // single underscores, so sections split on a double one
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut custodia_config: CustodiaConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        custodia_config.resolve_paths(&self.project_dir);
        custodia_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(custodia_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> CustodiaConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = ConfigLoader::new()
            .with_project_dir(temp_dir.path())
            .load()
            .expect("Failed to load config");

        assert_eq!(config.detection.failure_marker, "Failed password");
        assert_eq!(config.detection.high_threshold, 5);
        assert_eq!(config.crypto.kdf_memory_kib, 19_456);
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[evidence]
directory = "evidence"

[detection]
failure_marker = "authentication failure"
high_threshold = 10
medium_threshold = 4

[logging]
level = "debug"
"#;
        fs::write(project_dir.join("custodia.toml"), config_content)
            .expect("Failed to write config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        assert_eq!(config.evidence.directory, project_dir.join("evidence"));
        assert_eq!(config.detection.failure_marker, "authentication failure");
        assert_eq!(config.detection.high_threshold, 10);
        assert_eq!(config.detection.medium_threshold, 4);
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults
        assert_eq!(config.crypto.kdf_iterations, 2);
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("custodia.toml"),
            r#"
[crypto]
kdf_iterations = 3
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("custodia.local.toml"),
            r#"
[crypto]
kdf_iterations = 1
"#,
        )
        .expect("Failed to write local config");

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        assert_eq!(config.crypto.kdf_iterations, 1);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("custodia.toml"),
            r#"
[detection]
high_threshold = 2
medium_threshold = 4
"#,
        )
        .expect("Failed to write config");

        let result = ConfigLoader::new().with_project_dir(project_dir).load();
        assert!(result.is_err());
    }

    // Environment overrides follow CUSTODIA_<SECTION>__<KEY>, e.g.
    //
    // CUSTODIA_EVIDENCE__DIRECTORY=/var/lib/custodia/reports
    // CUSTODIA_DETECTION__HIGH_THRESHOLD=8
    //
    // They are not exercised here because the process environment is shared
    // across parallel tests.

    #[test]
    fn test_path_resolution() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .load()
            .expect("Failed to load config");

        assert!(config.evidence.directory.is_absolute());
        assert_eq!(config.evidence.directory, project_dir.join("reports"));
    }
}
