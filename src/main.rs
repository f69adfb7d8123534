//! # News RAG CLI (`nrag`)
//!
//! The `nrag` binary prepares the corpus, builds the BM25 index, and answers
//! questions against it.
//!
//! ## Usage
//!
//! ```bash
//! nrag --config ./config/nrag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `nrag prepare <dataset>` | Clean the raw dataset into the corpus file |
//! | `nrag build` | Fit the BM25 index and write the artifact |
//! | `nrag stats` | Summarize the index artifact |
//! | `nrag search "<query>"` | Retrieve ranked documents only |
//! | `nrag ask "<query>"` | Retrieve documents and answer the question |
//! | `nrag chat` | Interactive question loop over stdin |

use clap::{Parser, Subcommand};
use news_rag::{ask, config, index, logging, prepare, search, stats};
use news_rag_core::filter::FilterStrategy;
use std::path::PathBuf;

/// News RAG CLI: grounded question answering over news articles.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/nrag.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "nrag",
    about = "News RAG: BM25 retrieval and grounded answers over a news corpus",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/nrag.toml`.
    #[arg(long, global = true, default_value = "./config/nrag.toml")]
    config: PathBuf,

    /// Log debug output to stderr (overrides `NRAG_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw News Category Dataset file into the corpus.
    ///
    /// Reads one JSON article per line and writes `{headline, category,
    /// text}` lines to the corpus path.
    Prepare {
        /// Raw dataset (JSON lines).
        input: PathBuf,

        /// Output corpus path. Defaults to `[data].corpus_path`.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Build the BM25 index artifact from the corpus.
    Build {
        /// Corpus path. Defaults to `[data].corpus_path`.
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Artifact path. Defaults to `[data].index_path`.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show index statistics.
    Stats,

    /// Retrieve ranked documents for a query.
    Search {
        query: String,

        /// Number of documents to return. Defaults to `[retrieval].top_k`.
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        top_k: Option<usize>,
    },

    /// Answer a question from the retrieved documents.
    Ask {
        query: String,

        /// Number of documents to retrieve. Defaults to `[retrieval].top_k`.
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        top_k: Option<usize>,

        /// Relevance filter: `auto`, `semantic`, or `lexical`.
        #[arg(long)]
        strategy: Option<FilterStrategy>,
    },

    /// Ask questions interactively, one per line.
    ///
    /// Type `exit` or `quit` (or send EOF) to leave.
    Chat {
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        top_k: Option<usize>,

        #[arg(long)]
        strategy: Option<FilterStrategy>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Prepare { input, output } => {
            let output = output.unwrap_or_else(|| cfg.data.corpus_path.clone());
            prepare::run_prepare(&input, &output)?;
        }
        Commands::Build { corpus, output } => {
            index::run_build(&cfg, corpus.as_deref(), output.as_deref())?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Search { query, top_k } => {
            search::run_search(&cfg, &query, top_k)?;
        }
        Commands::Ask {
            query,
            top_k,
            strategy,
        } => {
            ask::run_ask(&cfg, &query, top_k, strategy).await?;
        }
        Commands::Chat { top_k, strategy } => {
            ask::run_chat(&cfg, top_k, strategy).await?;
        }
    }

    Ok(())
}
