//! Evidence decryption command.

use std::path::Path;

use anyhow::{Context, Result};
use custodia::Actor;

use crate::style::{print_hint, print_labeled, print_success};

pub fn run(project: &Path, artifact: &Path, actor: &str, secret: Option<String>) -> Result<()> {
    let registry = super::registry(project)?;
    let secret = super::resolve_secret(secret, false)?;
    let actor = Actor::user(actor);

    let decrypted = registry
        .decrypt_and_audit(artifact, &secret, &actor)
        .with_context(|| format!("Failed to decrypt {}", artifact.display()))?;
    let output = registry
        .vault()
        .write_decrypted(artifact, &decrypted.plaintext)
        .context("Failed to write decrypted evidence")?;

    print_success("Evidence decrypted");
    print_labeled("Output", &output.display().to_string());
    print_labeled("Incidents audited", &decrypted.audited.len().to_string());
    if decrypted.audited.is_empty() {
        // Each CLI run starts from an empty registry
        print_hint("No live incident references this artifact; no timeline recorded the access");
    }

    Ok(())
}
