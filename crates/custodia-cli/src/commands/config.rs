//! Configuration management commands.

use anyhow::{Context, Result};
use custodia_config::{CustodiaConfig, Paths};
use std::path::Path;

use crate::style::{print_error, print_hint, print_success};

/// Show current configuration.
pub fn show(project: &Path, format: &str) -> Result<()> {
    let config = CustodiaConfig::load_from_dir(project).context("Failed to load configuration")?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        "toml" => {
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{toml_str}");
        }
        _ => {
            println!("Custodia Configuration");
            println!("======================\n");

            println!("Evidence:");
            println!("  Directory: {}", config.evidence.directory.display());
            println!();

            println!("Detection:");
            println!("  Failure marker: {}", config.detection.failure_marker);
            println!("  High threshold: {}", config.detection.high_threshold);
            println!("  Medium threshold: {}", config.detection.medium_threshold);
            println!();

            println!("Crypto:");
            println!("  KDF memory (KiB): {}", config.crypto.kdf_memory_kib);
            println!("  KDF iterations: {}", config.crypto.kdf_iterations);
            println!("  KDF parallelism: {}", config.crypto.kdf_parallelism);
            println!();

            println!("Logging:");
            println!("  Level: {}", config.logging.level);
        }
    }

    Ok(())
}

/// Validate configuration files.
pub fn validate(project: &Path) -> Result<()> {
    println!("Validating configuration in {}...", project.display());

    if !Paths::is_initialized(project) {
        print_hint("No custodia.toml found; checking built-in defaults");
    }

    let config = match CustodiaConfig::load_from_dir(project) {
        Ok(config) => config,
        Err(e) => {
            print_error(&format!("Configuration validation failed: {e:#}"));
            return Err(e);
        }
    };

    // Catch KDF costs the cipher would refuse
    super::registry_from(&config)?;

    print_success("Configuration is valid");
    Ok(())
}
