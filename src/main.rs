//! # Leadstore CLI (`leads`)
//!
//! The `leads` binary manages an inventory of scraped-lead CSV files and
//! serves the dashboard HTTP API over it.
//!
//! ## Usage
//!
//! ```bash
//! leads --config ./config/leads.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `leads init` | Create the storage root and seed the registry from it |
//! | `leads serve` | Start the dashboard HTTP API |
//! | `leads import <files>` | Register CSV files from disk |
//! | `leads list` | List registered files (with search/industry filters) |
//! | `leads rm <name>` | Remove a file from the registry and storage |
//! | `leads stats` | Print inventory totals and the per-industry breakdown |
//! | `leads reconcile` | Repair registry/storage divergence |
//! | `leads industries` | Print the industry vocabulary |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use leadstore::blobstore::FsBlobStore;
use leadstore::config;
use leadstore::models::Industry;
use leadstore::registry::{IndustryFilter, ListFilter};
use leadstore::server;
use leadstore::stats;
use leadstore::store::LeadStore;

/// Leadstore CLI — a file registry and dashboard backend for scraped CSV
/// lead exports.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/leads.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "leads",
    about = "Leadstore — a lead-file registry and dashboard backend for scraped CSV exports",
    version,
    long_about = "Leadstore maintains the authoritative inventory of uploaded CSV lead files: \
    it counts records, classifies files by industry from their names, serves \
    search/filter/download/delete over HTTP for the dashboard, and keeps the registry \
    consistent with the underlying storage directory."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/leads.toml`. Storage root, server bind address,
    /// and upload limits are read from this file.
    #[arg(long, global = true, default_value = "./config/leads.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the storage root.
    ///
    /// Creates the storage directory if missing and runs the reconciliation
    /// scan that seeds the registry from any CSV files already present.
    /// This command is idempotent.
    Init,

    /// Start the dashboard HTTP API.
    ///
    /// Binds to the address configured in `[server].bind`. The registry is
    /// seeded from the storage root before the server accepts requests.
    Serve,

    /// Register CSV files from disk.
    ///
    /// Each file is validated, counted, classified, and stored, exactly as
    /// an upload through the API would be.
    Import {
        /// Paths of CSV files to register.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List registered files.
    List {
        /// Only files whose name contains this substring (case-insensitive).
        #[arg(long)]
        search: Option<String>,

        /// Only files classified into this industry (e.g. `plumbing`).
        #[arg(long)]
        industry: Option<Industry>,
    },

    /// Remove a file from the registry and storage.
    Rm {
        /// Registered file name (e.g. `hvac_leads.csv`).
        name: String,
    },

    /// Print inventory totals and the per-industry breakdown.
    Stats,

    /// Repair registry/storage divergence.
    ///
    /// Adopts valid CSV files found in storage but missing from the
    /// registry, deletes unparseable orphans, and drops registry entries
    /// whose backing file is gone.
    Reconcile,

    /// Print the fixed industry vocabulary.
    Industries,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Industries = cli.command {
        for ind in Industry::ALL {
            println!("{}", ind);
        }
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = LeadStore::open(&cfg).await?;
            println!(
                "Storage initialized at {} ({} files registered).",
                cfg.storage.root.display(),
                store.aggregate().total_files
            );
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Import { files } => {
            let store = LeadStore::open(&cfg).await?;
            let mut uploaded = 0u64;
            let mut records = 0u64;
            let mut failed = 0u64;

            for path in &files {
                let name = match path.file_name().and_then(|n| n.to_str()) {
                    Some(name) => name.to_string(),
                    None => {
                        eprintln!("skipping {}: not a usable file name", path.display());
                        failed += 1;
                        continue;
                    }
                };
                let bytes = match std::fs::read(path) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        eprintln!("skipping {}: {}", path.display(), err);
                        failed += 1;
                        continue;
                    }
                };
                match store.upload(&name, &bytes).await {
                    Ok(record) => {
                        println!(
                            "  {} — {} records{}",
                            record.name,
                            record.record_count,
                            record
                                .industry
                                .map(|i| format!(" ({})", i))
                                .unwrap_or_default()
                        );
                        uploaded += 1;
                        records += record.record_count;
                    }
                    Err(err) => {
                        eprintln!("  {} — {}", name, err);
                        failed += 1;
                    }
                }
            }

            println!("import");
            println!("  uploaded: {} files", uploaded);
            println!("  records: {}", records);
            if failed > 0 {
                println!("  failed: {}", failed);
                std::process::exit(1);
            }
            println!("ok");
        }
        Commands::List { search, industry } => {
            let store = LeadStore::open(&cfg).await?;
            let filter = ListFilter {
                name_contains: search,
                industry: industry.map(IndustryFilter::Only).unwrap_or_default(),
            };
            let files = store.list(&filter);

            if files.is_empty() {
                println!("No files match.");
                return Ok(());
            }

            println!(
                "{:<40} {:<14} {:>8} {:>10}   {}",
                "NAME", "INDUSTRY", "RECORDS", "SIZE", "UPLOADED"
            );
            println!("{}", "-".repeat(92));
            for file in &files {
                println!(
                    "{:<40} {:<14} {:>8} {:>10}   {}",
                    file.name,
                    file.industry.map(|i| i.as_str()).unwrap_or("-"),
                    file.record_count,
                    leadstore::stats::format_bytes(file.size_bytes),
                    file.uploaded_at.format("%Y-%m-%d %H:%M")
                );
            }
            println!();
            println!(
                "{} files, {} records",
                files.len(),
                files.iter().map(|f| f.record_count).sum::<u64>()
            );
        }
        Commands::Rm { name } => {
            let store = LeadStore::open(&cfg).await?;
            match store.delete(&name).await {
                Ok(()) => println!("Deleted {}", name),
                Err(err) => {
                    eprintln!("Error: {}", err);
                    std::process::exit(1);
                }
            }
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Reconcile => {
            // Start from an unseeded registry so the report shows the whole
            // scan: every valid blob is adopted, orphans are deleted.
            let blobs = FsBlobStore::open(&cfg.storage.root, &cfg.upload.allowed_extensions)?;
            let store = LeadStore::new(Arc::new(blobs), cfg.upload.clone());
            let report = store.reconcile().await?;
            println!("reconcile");
            println!("  adopted: {}", report.adopted);
            println!("  orphan blobs deleted: {}", report.orphans_deleted);
            println!("ok");
        }
        Commands::Industries => unreachable!(),
    }

    Ok(())
}
