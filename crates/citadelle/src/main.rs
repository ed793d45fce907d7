//! Citadelle - version history for legal documents.
//!
//! This is the main entry point for the citadelle CLI.

mod commands;
mod document;

use clap::{Parser, Subcommand};
use commands::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "citadelle")]
#[command(author, version, about = "Version history for citadelle documents", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding the version history (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a named version of a document file
    Snapshot {
        /// Document file (JSON with id, title and content)
        file: PathBuf,
        /// Version label (defaults to the current date and time)
        #[arg(short, long)]
        label: Option<String>,
    },
    /// List the versions of a document, newest first
    List {
        /// Document file or document id
        document: String,
    },
    /// Show what changed between two versions, or a version and a document file
    Diff {
        /// Older version id
        old: String,
        /// Newer version id
        #[arg(required_unless_present = "live")]
        new: Option<String>,
        /// Compare against the current content of this document file instead
        #[arg(long, conflicts_with = "new")]
        live: Option<PathBuf>,
    },
    /// Restore a document file to a version
    Restore {
        /// Version id to restore
        version: String,
        /// Document file to overwrite
        file: PathBuf,
    },
    /// Delete a version
    Delete {
        /// Version id
        version: String,
    },
    /// Take an automatic backup if the document changed since its last version
    Checkpoint {
        /// Document file
        file: PathBuf,
    },
    /// Drop automatic versions older than the retention window
    Prune,
    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    let (mut config, sources) =
        citadelle_history::HistoryConfig::load(Some(cwd.as_path())).await?;
    init_logging(cli.verbose, config.log_level);
    for source in &sources {
        tracing::debug!(path = %source.display(), "Using history config");
    }

    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    if let Commands::Config = cli.command {
        return show_config(&config, &sources);
    }

    let mut ctx = Context::open(config, cli.json).await?;

    match cli.command {
        Commands::Snapshot { file, label } => handle_snapshot(&mut ctx, &file, label).await,
        Commands::List { document } => handle_list(&ctx, &document).await,
        Commands::Diff { old, new, live } => handle_diff(&ctx, &old, new, live).await,
        Commands::Restore { version, file } => handle_restore(&mut ctx, &version, &file).await,
        Commands::Delete { version } => handle_delete(&mut ctx, &version).await,
        Commands::Checkpoint { file } => handle_checkpoint(&mut ctx, &file).await,
        Commands::Prune => handle_prune(&mut ctx).await,
        Commands::Config => Ok(()),
    }
}
