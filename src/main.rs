//! # Shivaya Catalog CLI (`shivaya`)
//!
//! ## Usage
//!
//! ```bash
//! shivaya --config ./config/shivaya.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shivaya sources` | List configured sources and whether they are reachable |
//! | `shivaya load` | Load the catalog and print a per-source and per-category summary |
//! | `shivaya search "<query>"` | Ranked search across categories, subcategories and products |
//! | `shivaya browse <path>` | Resolve a `/products/...` URL and print that page |
//! | `shivaya export` | Write the resolved catalog as JSON |
//! | `shivaya interactive` | Type-ahead search from stdin, debounced |
//! | `shivaya serve` | Start the JSON HTTP server |

use clap::{Parser, Subcommand};
use shivaya_catalog::{browse, config, export, loader, logging, search, server, sources};
use std::path::PathBuf;

/// Shivaya Solutions product catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "shivaya",
    about = "Shivaya Solutions product catalog: load, search, browse and serve",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shivaya.toml")]
    config: PathBuf,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured catalog sources and their status.
    Sources,

    /// Load the catalog and print a summary.
    ///
    /// Exits non-zero when every source failed.
    Load,

    /// Search the catalog.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results (defaults to `[search].max_results`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the page for a catalog URL, e.g. `/products/metal-pens/astral-series`.
    ///
    /// Segments that match nothing are dropped; the deepest matching page
    /// is shown.
    Browse {
        /// Path starting with `/products`.
        path: String,
    },

    /// Export the resolved catalog as JSON.
    Export {
        /// Output file. Writes to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Interactive type-ahead search.
    ///
    /// Each input line is the current search text; results print once the
    /// text has been stable for `[search].debounce_ms`. `:open N` opens a
    /// result, `:back` goes up a level, `:quit` exits.
    Interactive,

    /// Start the JSON HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log)?;

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Load => {
            loader::run_load(&cfg).await?;
        }
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Browse { path } => {
            browse::run_browse(&cfg, &path).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Interactive => {
            search::run_interactive(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
