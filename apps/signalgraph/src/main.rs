//! # SignalGraph - Deterministic Knowledge-Graph Pipeline
//!
//! The main binary for the SignalGraph graph builder.
//!
//! This application provides:
//! - Deterministic discovery and checksumming of local text files
//! - A built-in rule-based extractor (regex, no NLP)
//! - Idempotent merging into a provenance-tracked graph store
//! - Canonical JSON export/import and binary snapshots
//! - Read-only graph analytics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                apps/signalgraph (THE BINARY)                │
//! │                                                             │
//! │  ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌─────────┐  │
//! │  │   CLI    │   │ discover  │   │ extract │   │ config  │  │
//! │  │  (clap)  │   │ (sha256)  │   │ (regex) │   │ (toml)  │  │
//! │  └────┬─────┘   └─────┬─────┘   └────┬────┘   └────┬────┘  │
//! │       └───────────────┴──────┬───────┴─────────────┘       │
//! │                              ▼                              │
//! │                   ┌────────────────────┐                    │
//! │                   │  signalgraph-core  │                    │
//! │                   │    (THE LOGIC)     │                    │
//! │                   └────────────────────┘                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! signalgraph init
//! signalgraph ingest --data-dir ./docs
//! signalgraph insights --min-support 2
//! signalgraph export --output graph.json
//! ```

mod cli;
mod config;
mod discover;
mod extract;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing — SIGNALGRAPH_LOG_FORMAT=json enables
    // machine-parseable output.
    let log_format =
        std::env::var("SIGNALGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "signalgraph=debug"
    } else {
        "signalgraph=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    match cli::execute(cli) {
        Ok(cli::RunStatus::Clean) => {}
        Ok(cli::RunStatus::PartialFailures) => {
            tracing::warn!("run completed with per-file failures");
            std::process::exit(2);
        }
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
