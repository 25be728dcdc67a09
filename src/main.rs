//! # nano-graphrag CLI (`ngrag`)
//!
//! ## Usage
//!
//! ```bash
//! ngrag --config ./config/ngrag.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ngrag chunk <file> [--json]` | Preview how a file is split into token windows |
//! | `ngrag query "<question>" --doc <file>...` | Index documents and answer a question |
//! | `ngrag graph <edges-file>` | Cluster an edge list and print its communities |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nano_graphrag::query_cmd::QueryOverrides;
use nano_graphrag::{chunk_cmd, config, graph_cmd, logger, query_cmd};

/// nano-graphrag CLI: chunk documents, retrieve context, and answer
/// questions with an optional LLM.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "ngrag",
    about = "nano-graphrag: token chunking, vector retrieval, and naive RAG answers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ngrag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk a file and print each window (nothing is stored).
    Chunk {
        /// Text file to chunk.
        file: PathBuf,

        /// Print the chunks as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Index documents and answer a question over them.
    ///
    /// Each document is split into paragraphs on blank lines; every
    /// paragraph is inserted as its own document.
    Query {
        /// The question.
        question: String,

        /// Document file(s) to index before querying.
        #[arg(long = "doc", required = true)]
        docs: Vec<PathBuf>,

        /// Query mode: `naive`, `local`, or `global`. Only `naive` retrieves.
        #[arg(long)]
        mode: Option<String>,

        /// Number of chunks to retrieve.
        #[arg(long)]
        top_k: Option<usize>,

        /// Token budget for the assembled context.
        #[arg(long)]
        max_tokens: Option<usize>,

        /// Print the retrieved context instead of calling the LLM.
        #[arg(long)]
        only_context: bool,

        /// Requested answer format, passed to the LLM.
        #[arg(long)]
        response_type: Option<String>,
    },

    /// Cluster an edge list (`a b` per line) and print the communities.
    Graph {
        /// Edge-list file.
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_or_default(&cli.config)?;
    logger::init(&cfg.logging.level)?;

    match cli.command {
        Commands::Chunk { file, json } => {
            chunk_cmd::run_chunk(&cfg, &file, json)?;
        }
        Commands::Query {
            question,
            docs,
            mode,
            top_k,
            max_tokens,
            only_context,
            response_type,
        } => {
            let overrides = QueryOverrides {
                mode,
                top_k,
                max_tokens,
                only_context,
                response_type,
            };
            query_cmd::run_query(&cfg, &question, &docs, &overrides)?;
        }
        Commands::Graph { file } => {
            graph_cmd::run_graph(&file)?;
        }
    }

    Ok(())
}
