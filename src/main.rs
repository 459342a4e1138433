use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use voice_rag::Result;
use voice_rag::commands::{ask, build_index, query, show_status, voice};
use voice_rag::config::{Config, get_config_dir, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "voice-rag")]
#[command(about = "A retrieval-augmented voice assistant for financial product questions")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml (defaults to ~/.voice-rag)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the OpenAI connection, index locations and playback
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Rebuild the vector index from the documents directory
    Build {
        /// Documents directory (overrides the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Vectors file to write; the chunks file is placed beside it
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the chunks retrieved for a question
    Query {
        text: String,
        /// Number of chunks to retrieve
        #[arg(short, long, value_parser = top_k())]
        k: Option<usize>,
    },
    /// Answer a typed question from the indexed documents
    Ask {
        text: String,
        /// Number of chunks to retrieve
        #[arg(short, long, value_parser = top_k())]
        k: Option<usize>,
        /// Also synthesize the answer as speech
        #[arg(long)]
        speak: bool,
    },
    /// Answer a recorded question and reply with speech
    Voice {
        /// Audio file containing the question
        audio: PathBuf,
        /// Number of chunks to retrieve
        #[arg(short, long, value_parser = top_k())]
        k: Option<usize>,
    },
    /// Show documents, index and provider status
    Status,
}

/// Retrieval depth: a positive chunk count.
fn top_k() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir().map_err(|e| voice_rag::RagError::Config(e.to_string()))?,
    };

    if let Commands::Config { show: false } = cli.command {
        run_interactive_config(&config_dir)?;
        return Ok(());
    }

    let config = Config::load(&config_dir)?;

    match cli.command {
        Commands::Config { .. } => {
            show_config(&config)?;
        }
        Commands::Build { dir, output } => {
            build_index(&config, dir, output)?;
        }
        Commands::Query { text, k } => {
            query(&config, &text, k)?;
        }
        Commands::Ask { text, k, speak } => {
            ask(&config, &text, k, speak)?;
        }
        Commands::Voice { audio, k } => {
            voice(&config, &audio, k)?;
        }
        Commands::Status => {
            show_status(&config)?;
        }
    }

    Ok(())
}
