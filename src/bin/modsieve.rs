//! modsieve: check document and settings tooling
//!
//! Validates and resolves check documents and shows the effective cache
//! settings operators would get for a community.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use modsieve::cache::stable_hash;
use modsieve::config::load_document;
use modsieve::{ModsieveError, Settings};
use serde_json::json;

/// modsieve CLI
#[derive(Parser)]
#[command(name = "modsieve")]
#[command(version = modsieve::PKG_VERSION, long_version = long_version())]
#[command(about = "Moderation check document tooling")]
struct Args {
    /// Settings file (default: ~/.modsieve/config.toml, then /etc/modsieve/config.toml)
    #[arg(short, long, env = "MODSIEVE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that a document is well-formed and every reference resolves
    Validate {
        /// Path to a JSON check document
        file: PathBuf,
    },

    /// Print a document with every named reference inlined
    Resolve {
        /// Path to a JSON check document
        file: PathBuf,
    },

    /// Print effective cache settings and their hash
    Settings {
        /// Apply this community's overrides
        #[arg(long)]
        community: Option<String>,
    },
}

fn long_version() -> String {
    modsieve::version_string()
}

fn read_document(path: &Path) -> Result<modsieve::ModerationConfig, ModsieveError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        ModsieveError::Configuration(format!("Failed to read {}: {e}", path.display()))
    })?;
    let doc = serde_json::from_str(&raw)?;
    load_document(doc)
}

fn run(args: Args) -> Result<(), ModsieveError> {
    match args.command {
        Command::Validate { file } => {
            let config = read_document(&file)?;
            println!(
                "{}: ok ({} check{})",
                file.display(),
                config.checks.len(),
                if config.checks.len() == 1 { "" } else { "s" }
            );
        }
        Command::Resolve { file } => {
            let config = read_document(&file)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Settings { community } => {
            let settings = Settings::load(args.config.as_deref())?;
            let defaults = settings.cache_defaults();
            let effective = match &community {
                Some(name) => settings.community_overrides(name).apply(&defaults),
                None => defaults,
            };
            let report = json!({
                "community": community,
                "prefix": settings.cache.prefix,
                "hash": stable_hash(&effective),
                "settings": effective,
                "footer": community.as_deref().and_then(|c| settings.footer(c)),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
