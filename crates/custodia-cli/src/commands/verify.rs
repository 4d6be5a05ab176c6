//! Sealed artifact verification command.

use std::path::Path;

use anyhow::{Context, Result};

use crate::style::{print_info_table, print_success};

pub fn run(artifact: &Path) -> Result<()> {
    let metadata = custodia::verify_artifact(artifact)
        .with_context(|| format!("Integrity verification failed for {}", artifact.display()))?;

    let created_by = metadata.created_by.to_string();
    let created_at = metadata.created_at.to_rfc3339();
    let version = metadata.version.to_string();
    let hash = metadata.integrity_hash.to_hex();

    print_success("Integrity hash matches");
    print_info_table(&[
        ("Created by", created_by.as_str()),
        ("Created at", created_at.as_str()),
        ("Version", version.as_str()),
        ("Reason", metadata.reason.as_str()),
        ("SHA-256", hash.as_str()),
    ]);

    Ok(())
}
