//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "askrag")]
#[command(about = "Ask questions about a personal knowledge base")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: configured level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the configuration file (default: config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable CORS (overrides config)
        #[arg(long)]
        cors: bool,
    },
    /// Chunk, embed and store every document in a directory
    Ingest {
        /// Directory to ingest (default: rag.knowledge_base_dir)
        dir: Option<PathBuf>,
        /// File extensions to include, comma separated (default: rag.file_extensions)
        #[arg(short, long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,
        /// Clear the collection before ingesting
        #[arg(long)]
        reset: bool,
    },
    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,
        /// Stream the answer as it is generated
        #[arg(short, long)]
        stream: bool,
        /// Number of chunks to retrieve (overrides config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Show the retrieved sources
        #[arg(long)]
        sources: bool,
    },
    /// Interactive question session that keeps conversation history
    Chat {
        /// Include earlier turns in each prompt
        #[arg(long)]
        history: bool,
    },
    /// Show vector store statistics
    Stats,
    /// Delete every chunk in the collection
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Show current configuration
    Config,
}
