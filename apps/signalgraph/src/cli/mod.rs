//! # SignalGraph CLI Module
//!
//! This module implements the CLI interface for SignalGraph.
//!
//! ## Available Commands
//!
//! - `init` - Initialize a new graph database
//! - `ingest` - Discover and merge source files or extraction batches
//! - `status` - Show graph status
//! - `export` - Export the graph (canonical JSON or binary snapshot)
//! - `import` - Import a graph, replacing the database
//! - `insights` - Compute degree, component, and motif analytics
//! - `verify` - Check consistency and canonical re-export stability

mod commands;

use clap::{Parser, Subcommand};
use signalgraph_core::SignalGraphError;
use std::path::PathBuf;

pub use commands::RunStatus;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// SignalGraph - deterministic knowledge-graph pipeline
///
/// Builds a provenance-tracked knowledge graph from local text files.
/// The same inputs always produce the same graph and byte-identical
/// exports, no matter the order files are processed in.
#[derive(Parser, Debug)]
#[command(name = "signalgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the graph database
    #[arg(short = 'D', long, global = true, default_value = "signalgraph.db")]
    pub database: PathBuf,

    /// Path to the configuration file (defaults to ./signalgraph.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty graph database
    Init {
        /// Overwrite an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// Ingest source files or extraction batches into the graph
    Ingest {
        /// Directory of text files to discover and extract
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Extraction-batch JSON file(s) produced by an external extractor
        #[arg(short, long)]
        batch: Vec<PathBuf>,
    },

    /// Show graph status
    Status,

    /// Export the graph to a file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: "json" (canonical) or "snapshot" (binary)
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Import a graph from a file, replacing the database
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Input format: "json" (canonical) or "snapshot" (binary)
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Compute analytics over the graph
    Insights {
        /// Minimum support for frequent motif reporting
        #[arg(short, long)]
        min_support: Option<u64>,
    },

    /// Verify graph consistency and canonical export stability
    Verify,
}

// =============================================================================
// COMMAND DISPATCH
// =============================================================================

/// Execute the parsed CLI command.
pub fn execute(cli: Cli) -> Result<RunStatus, SignalGraphError> {
    let config = crate::config::AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Init { force } => {
            commands::cmd_init(&cli.database, force)?;
            Ok(RunStatus::Clean)
        }
        Commands::Ingest { data_dir, batch } => commands::cmd_ingest(
            &cli.database,
            &config,
            data_dir.as_deref(),
            &batch,
            cli.json_mode,
        ),
        Commands::Status => {
            commands::cmd_status(&cli.database, cli.json_mode)?;
            Ok(RunStatus::Clean)
        }
        Commands::Export { output, format } => {
            commands::cmd_export(&cli.database, &output, &format)?;
            Ok(RunStatus::Clean)
        }
        Commands::Import { input, format } => {
            commands::cmd_import(&cli.database, &input, &format)?;
            Ok(RunStatus::Clean)
        }
        Commands::Insights { min_support } => {
            let min_support = min_support.unwrap_or(config.insights.min_support);
            commands::cmd_insights(&cli.database, min_support, cli.json_mode)?;
            Ok(RunStatus::Clean)
        }
        Commands::Verify => {
            commands::cmd_verify(&cli.database)?;
            Ok(RunStatus::Clean)
        }
    }
}
