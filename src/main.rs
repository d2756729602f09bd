//! # Context Ranker CLI (`ctxr`)
//!
//! ## Usage
//!
//! ```bash
//! ctxr --config ./config/ctxr.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ctxr search "<query>"` | Rank documents for a query |
//! | `ctxr analyze "<query>"` | Show terms, intent and subject for a query |
//! | `ctxr inspect` | Load the corpus and summarize it |
//! | `ctxr serve` | Start the HTTP API |
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`), so
//! stdout carries only command output.

use clap::{Parser, Subcommand};
use context_ranker::{config, search, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Context Ranker: query-aware retrieval over a documentation export.
///
/// All commands except `analyze` read the TOML file given by `--config`.
/// See `config/ctxr.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ctxr",
    about = "Context Ranker: query-aware retrieval over a documentation export",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ctxr.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank documents for a query.
    ///
    /// Loads the corpus, then prints curated results best first.
    Search {
        /// The search query.
        query: String,

        /// Maximum number of results to print.
        #[arg(long)]
        limit: Option<usize>,

        /// Print the per-factor score breakdown for each result.
        #[arg(long)]
        explain: bool,
    },

    /// Show how a query is analyzed (terms, intent, subject).
    Analyze {
        /// The query to analyze.
        query: String,
    },

    /// Load the corpus once and print a summary.
    Inspect,

    /// Start the HTTP API on `[server].bind`.
    Serve,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Analysis needs no corpus and therefore no config.
    if let Commands::Analyze { query } = &cli.command {
        return search::run_analyze(query);
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search {
            query,
            limit,
            explain,
        } => {
            if limit == Some(0) {
                anyhow::bail!("--limit must be >= 1");
            }
            search::run_search(&cfg, &query, limit, explain).await?;
        }
        Commands::Inspect => {
            search::run_inspect(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Analyze { .. } => unreachable!(),
    }

    Ok(())
}
