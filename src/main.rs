//! Binary entry point for import-dedup.
//!
//! This binary provides the CLI interface for import duplicate detection.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use import_dedup::cli::{self, CheckOptions, OutputFormat};
use import_dedup::config::ImportDedupConfig;
use import_dedup::observability::{self, InitOptions};
use import_dedup::{Destination, ScanMode};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// import-dedup - Detect files already imported to cloud storage.
#[derive(Parser)]
#[command(name = "import-dedup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "IMPORT_DEDUP_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Print Prometheus metrics to stderr on exit.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Classify files as original, history duplicate, or content duplicate.
    Check {
        /// Candidate files.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory holding the destination's current contents.
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Import history snapshot (JSON).
        #[arg(long)]
        history: Option<PathBuf>,

        /// Scan mode: content or history.
        #[arg(short, long, default_value = "content", value_parser = parse_mode)]
        mode: ScanMode,

        /// Import destination.
        #[arg(short, long, default_value = "cloud-drive", value_parser = parse_destination)]
        destination: Destination,

        /// Output format: table or json.
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Print metadata fingerprints and content hashes.
    Hash {
        /// Files to hash.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let observability = match observability::init_from_config(
        Some(&config.observability),
        InitOptions {
            verbose: cli.verbose,
            metrics: cli.metrics,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    let result = run_command(cli, config).await;

    if let Some(rendered) = observability.render_metrics() {
        eprintln!("{rendered}");
    }

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(cli: Cli, config: ImportDedupConfig) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Check {
            files,
            library,
            history,
            mode,
            destination,
            format,
        } => {
            let options = CheckOptions::new(files)
                .with_library(library.or_else(|| config.library_dir.clone()))
                .with_history(history.or_else(|| config.history_file.clone()))
                .with_mode(mode)
                .with_destination(destination);
            let format = format.parse::<OutputFormat>().unwrap_or_default();

            let reports = cli::cmd_check(&options, &config.dedup, format)
                .await
                .context("check failed")?;

            if reports.iter().any(|r| r.error.is_some()) {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        },

        Commands::Hash { files } => {
            cli::cmd_hash(&files, &config.dedup)
                .await
                .context("hash failed")?;
            Ok(ExitCode::SUCCESS)
        },

        Commands::Config { show } => {
            cli::cmd_config(&config, show)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}

/// Loads configuration.
fn load_config(path: Option<&Path>) -> anyhow::Result<ImportDedupConfig> {
    if let Some(config_path) = path {
        return ImportDedupConfig::load_from_file(config_path)
            .with_context(|| format!("reading {}", config_path.display()));
    }

    Ok(ImportDedupConfig::load_default())
}

fn parse_mode(s: &str) -> Result<ScanMode, String> {
    ScanMode::parse(s).ok_or_else(|| format!("unknown scan mode '{s}' (expected content or history)"))
}

fn parse_destination(s: &str) -> Result<Destination, String> {
    Destination::parse(s).ok_or_else(|| {
        let known: Vec<&str> = Destination::all().iter().map(Destination::as_str).collect();
        format!("unknown destination '{s}' (expected one of: {})", known.join(", "))
    })
}
