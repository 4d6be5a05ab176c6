//! Custodia CLI.
//!
//! Incident analysis and forensic evidence handling from the command line.
//!
//! # Quick Start
//!
//! ```bash
//! # Analyze an auth log; writes sealed + encrypted evidence under ./reports
//! custodia analyze /var/log/auth.log --actor alice
//!
//! # Decrypt an artifact (writes <name>_decrypted.json next to it)
//! custodia decrypt reports/incident_report_..._v1.json.enc --actor alice
//!
//! # Check a sealed artifact's integrity hash
//! custodia verify reports/incident_report_..._v1.json
//! ```

mod commands;
mod style;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use custodia_config::ConfigLoader;
use tracing_subscriber::EnvFilter;

/// Custodia - incident tracking with tamper-evident forensic evidence.
#[derive(Parser)]
#[command(name = "custodia")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory holding custodia.toml.
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an authentication log and seal evidence for the incidents found.
    Analyze {
        /// Path to the log file.
        log: PathBuf,

        /// Name of the analyst running the analysis.
        #[arg(short, long)]
        actor: String,

        /// Encryption secret (prompted for when omitted).
        #[arg(long, env = "CUSTODIA_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Print incidents as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Decrypt an encrypted evidence artifact.
    Decrypt {
        /// Path to the `.enc` artifact.
        artifact: PathBuf,

        /// Name of the analyst accessing the evidence.
        #[arg(short, long)]
        actor: String,

        /// Decryption secret (prompted for when omitted).
        #[arg(long, env = "CUSTODIA_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Verify the integrity hash of a sealed artifact.
    Verify {
        /// Path to the sealed `.json` artifact.
        artifact: PathBuf,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration.
    Show {
        /// Output format (text, toml, json).
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate configuration files.
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    style::set_no_color(cli.no_color);

    // Level from config; RUST_LOG still wins when set
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        ConfigLoader::new()
            .with_project_dir(&cli.project)
            .load_or_default()
            .logging
            .level
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            log,
            actor,
            secret,
            json,
        } => commands::analyze::run(&cli.project, &log, &actor, secret, json),
        Commands::Decrypt {
            artifact,
            actor,
            secret,
        } => commands::decrypt::run(&cli.project, &artifact, &actor, secret),
        Commands::Verify { artifact } => commands::verify::run(&artifact),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { format } => commands::config::show(&cli.project, &format),
            ConfigCommands::Validate => commands::config::validate(&cli.project),
        },
    }
}
