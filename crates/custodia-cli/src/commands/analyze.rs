//! Log analysis command.

use std::path::Path;

use anyhow::{Context, Result};
use custodia::{Actor, IncidentView};

use crate::style::{self, print_hint, print_labeled, print_spacer, print_success};

pub fn run(project: &Path, log: &Path, actor: &str, secret: Option<String>, json: bool) -> Result<()> {
    let registry = super::registry(project)?;
    let secret = super::resolve_secret(secret, true)?;
    let actor = Actor::user(actor);

    let incidents = registry
        .analyze_log_file(log, &actor, &secret)
        .with_context(|| format!("Failed to analyze {}", log.display()))?;

    if json {
        let views: Vec<IncidentView> = incidents.into_iter().map(IncidentView::from).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if incidents.is_empty() {
        print_success("No failed authentication attempts found");
        return Ok(());
    }

    style::print_incident_table(&incidents);
    print_spacer();
    print_success(&format!("{} incident(s) created", incidents.len()));
    if let Some(artifact) = incidents[0].artifact_path() {
        print_labeled("Evidence", &artifact.display().to_string());
    }
    print_hint("Decrypt with: custodia decrypt <artifact> --actor <name>");

    Ok(())
}
