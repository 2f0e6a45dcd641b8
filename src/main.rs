//! # QA Corpus CLI (`corpus`)
//!
//! ## Usage
//!
//! ```bash
//! corpus --config ./config/corpus.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `corpus init` | Create the SQLite database and schema |
//! | `corpus serve` | Start the HTTP server |
//! | `corpus stats` | Print collection statistics |
//! | `corpus health` | Check a running server |
//! | `corpus contexts` | List distinct contexts |
//! | `corpus categories` | List distinct categories |
//! | `corpus list` | Print the oldest stored documents |
//! | `corpus get <id>` | Print one stored document |
//! | `corpus submit <file>` | Shape forms from a file and post them as one batch |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use qa_corpus::{config, get, migrate, server, stats, submit, taxonomy};
use qa_corpus_core::models::DocumentFamily;

/// QA Corpus CLI: curate FAQ, reverse-prompt and QA training documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means defaults.
#[derive(Parser)]
#[command(
    name = "corpus",
    about = "Curate FAQ, reverse-prompt and QA training documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/corpus.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `qa_pairs` table.
    /// Running it more than once is safe.
    Init,

    /// Start the HTTP server.
    Serve {
        /// Override `[server].port`.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print aggregate statistics.
    ///
    /// Reads the local database, or a running server with `--server`.
    Stats {
        /// Server base URL to query instead of the local database.
        #[arg(long)]
        server: Option<String>,
    },

    /// Check a running server's health endpoint.
    Health {
        /// Server base URL; defaults to `[client].base_url`.
        #[arg(long)]
        server: Option<String>,
    },

    /// List distinct contexts.
    Contexts {
        /// Only contexts used by this document type (`faq`, `reverse-prompt`).
        #[arg(long = "type")]
        doc_type: Option<String>,

        /// Server base URL to query instead of the local database.
        #[arg(long)]
        server: Option<String>,
    },

    /// List distinct categories.
    Categories {
        /// Only categories used within this context.
        #[arg(long)]
        context: Option<String>,

        /// Server base URL to query instead of the local database.
        #[arg(long)]
        server: Option<String>,
    },

    /// Print the oldest stored documents as JSON.
    List {
        /// List generic QA pairs instead of FAQ / reverse-prompt documents.
        #[arg(long)]
        qa: bool,

        /// Maximum number of documents.
        #[arg(long, default_value_t = server::DEFAULT_LIST_LIMIT)]
        limit: i64,
    },

    /// Print one stored document by id.
    Get {
        /// Document UUID.
        id: String,
    },

    /// Shape forms from a file and submit them as one batch.
    ///
    /// The file holds a JSON array of forms or one form per line. Every
    /// form is validated before anything is sent.
    Submit {
        /// Path to the forms file.
        file: PathBuf,

        /// Submit as generic QA pairs instead of FAQ / reverse-prompt documents.
        #[arg(long)]
        qa: bool,

        /// Server base URL; defaults to `[client].base_url`.
        #[arg(long)]
        server: Option<String>,

        /// Shape and print the batch without sending it.
        #[arg(long)]
        dry_run: bool,
    },
}

fn family(qa: bool) -> DocumentFamily {
    if qa {
        DocumentFamily::QaPair
    } else {
        DocumentFamily::PromptMe
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                cfg.server.port = port;
                config::validate(&cfg)?;
            }
            server::run_server(&cfg).await?;
        }
        Commands::Stats { server } => match server {
            Some(url) => stats::run_remote_stats(&url).await?,
            None => stats::run_stats(&cfg).await?,
        },
        Commands::Health { server } => {
            taxonomy::run_health(server.as_deref().unwrap_or(&cfg.client.base_url)).await?;
        }
        Commands::Contexts { doc_type, server } => {
            taxonomy::run_contexts(&cfg, non_blank(&doc_type), server.as_deref()).await?;
        }
        Commands::Categories { context, server } => {
            taxonomy::run_categories(&cfg, non_blank(&context), server.as_deref()).await?;
        }
        Commands::List { qa, limit } => {
            get::run_list(&cfg, family(qa), limit).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Submit {
            file,
            qa,
            server,
            dry_run,
        } => {
            submit::run_submit(&cfg, &file, family(qa), server.as_deref(), dry_run).await?;
        }
    }

    Ok(())
}
