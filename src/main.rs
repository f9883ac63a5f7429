// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Taxis: Extension-Based Directory Organizer
//!
//! Moves the top-level files of a user-granted directory into category
//! subfolders chosen from each file's extension.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use taxis::config::AppConfig;
use taxis::engine::{OrganizeEngine, Report};
use taxis::grant::{
    DirectoryPicker, GrantStatus, GrantStore, JsonFileStore, PresetPicker, PromptPicker,
};
use taxis::{Result, TaxisError};

/// Taxis CLI - Extension-Based Directory Organizer
#[derive(Parser, Debug)]
#[command(name = "taxis")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Organize a directory's files into category subfolders", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for run reports
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one organize pass over the granted directory
    Organize {
        /// Directory to grant access to when no grant is persisted
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Dry run mode (report planned moves without moving)
        #[arg(long)]
        dry_run: bool,
    },

    /// Organize repeatedly on a timer until interrupted
    Run {
        /// Directory to grant access to when no grant is persisted
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Seconds between passes (overrides config)
        #[arg(short, long)]
        every: Option<u64>,

        /// Dry run mode (report planned moves without moving)
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete the persisted directory grant
    Reset,

    /// Show grant and configuration status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if !cli.quiet {
        info!("Taxis v1.0.0 - Directory Organizer");
    }

    // Load configuration
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Organize { dir, dry_run }) => {
            run_organize(config, dir, dry_run, &cli.format)
        }
        Some(Commands::Run { dir, every, dry_run }) => {
            run_loop(config, dir, every, dry_run, &cli.format).await
        }
        Some(Commands::Reset) => run_reset(config),
        Some(Commands::Status) => run_status(config, &cli.config),
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        None => {
            // Default: one organize pass
            run_organize(config, None, false, &cli.format)
        }
    }
}

/// Build the grant store: JSON-file persistence plus a picker seeded
/// from --dir, falling back to a terminal prompt.
fn grant_store(config: &AppConfig, dir: Option<PathBuf>) -> GrantStore {
    let store = Box::new(JsonFileStore::new(PathBuf::from(&config.grant.store_path)));
    let picker: Box<dyn DirectoryPicker> = match dir {
        Some(path) => Box::new(PresetPicker::new(Some(path))),
        None => Box::new(PromptPicker),
    };
    GrantStore::new(store, picker)
}

/// Run a single organize pass
fn run_organize(
    config: AppConfig,
    dir: Option<PathBuf>,
    dry_run: bool,
    format: &str,
) -> Result<()> {
    if dry_run {
        warn!("DRY RUN MODE - files will not be moved");
    }

    let grants = grant_store(&config, dir);
    let reference = grants.obtain()?;

    let engine = OrganizeEngine::new(dry_run);
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let report = engine.organize(&reference, &cancel_rx)?;

    print_report(&report, format)?;
    Ok(())
}

/// Run organize passes on a timer until Ctrl+C / SIGTERM
async fn run_loop(
    config: AppConfig,
    dir: Option<PathBuf>,
    every: Option<u64>,
    dry_run: bool,
    format: &str,
) -> Result<()> {
    let interval = Duration::from_secs(every.unwrap_or(config.run.interval_secs));
    info!("Organizing every {:?}", interval);

    if dry_run {
        warn!("DRY RUN MODE - files will not be moved");
    }

    let grants = grant_store(&config, dir);
    let reference = grants.obtain()?;
    let engine = OrganizeEngine::new(dry_run);

    // Setup graceful shutdown; the channel doubles as the engine's
    // cancellation token.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }

        let _ = shutdown_tx.send(true);
    });

    info!("Organizer active. Press Ctrl+C to stop.");

    let mut shutdown = shutdown_rx.clone();
    loop {
        let report = engine.organize(&reference, &shutdown_rx)?;
        print_report(&report, format)?;

        if *shutdown.borrow() || report.cancelled {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => break,
        }
    }

    info!("Taxis stopped.");
    Ok(())
}

/// Print a run report in the requested format
fn print_report(report: &Report, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        _ => {
            for entry in &report.entries {
                match &entry.error {
                    Some(e) => println!(
                        "FAILED {} -> {}: {}",
                        entry.source.display(),
                        entry.destination.display(),
                        e
                    ),
                    None => println!(
                        "{} {} -> {}",
                        if report.dry_run { "would move" } else { "moved" },
                        entry.source.display(),
                        entry.destination.display()
                    ),
                }
            }
            println!(
                "\n{} processed, {} moved, {} failed{}",
                report.processed,
                report.moved,
                report.failed,
                if report.cancelled { " (cancelled)" } else { "" }
            );
        }
    }
    Ok(())
}

/// Delete the persisted grant
fn run_reset(config: AppConfig) -> Result<()> {
    let grants = grant_store(&config, None);
    grants.reset_grant()?;
    println!("Grant reset. The next run will ask for a directory again.");
    Ok(())
}

/// Show grant and configuration status
fn run_status(config: AppConfig, config_path: &Path) -> Result<()> {
    println!("Taxis v1.0.0 Status");
    println!("===================");

    let grants = grant_store(&config, None);
    match grants.status()? {
        GrantStatus::Valid(path) => println!("Grant: valid, {}", path.display()),
        GrantStatus::Stale(path) => {
            println!("Grant: stale (directory gone), {}", path.display())
        }
        GrantStatus::Absent => println!("Grant: none persisted"),
    }

    println!("\nConfiguration ({:?}):", config_path);
    println!("  Grant store: {}", config.grant.store_path);
    println!("  Run interval: {}s", config.run.interval_secs);

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            if output.exists() {
                return Err(TaxisError::Config(format!(
                    "{} already exists",
                    output.display()
                )));
            }
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            println!("Configuration at {:?} is valid", config_path);
            println!("  Grant store: {}", config.grant.store_path);
            println!("  Run interval: {}s", config.run.interval_secs);
        }
    }

    Ok(())
}
