use clap::{Parser, Subcommand};
use console::style;
use flow_adapters::Result;
use flow_adapters::commands::{chat, convert, get_key, prompt, smart_documents, vector};
use flow_adapters::config::{Config, resolve_config_dir, show_config, write_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flow-adapters")]
#[command(about = "Store adapters for flow-based orchestration: Redis, MongoDB and pgvector")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml (defaults to ~/.flow-adapters)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the configuration file, or show it
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Look up a key in Redis
    Get {
        /// Key to look up
        key: String,
    },
    /// Store a JSON document in MongoDB, or search stored documents
    Docs {
        /// JSON object to store, or text to search for
        input: String,
    },
    /// Store a JSON document in pgvector, or run a similarity search
    Vector {
        /// JSON object to store, text to search for, or "" to list documents
        input: String,
        /// Number of results to return
        #[arg(long)]
        k: Option<usize>,
    },
    /// Store chat messages in Redis and print the session history
    Chat {
        /// Session ID (defaults to the configured session)
        #[arg(long)]
        session: Option<String>,
        /// User message to store
        #[arg(long)]
        user: Option<String>,
        /// AI message to store
        #[arg(long)]
        ai: Option<String>,
    },
    /// Convert message text into a data payload
    Convert {
        /// Message text, JSON or plain
        text: String,
    },
    /// Build an explanation prompt from API data and domain knowledge
    Prompt {
        /// API response as JSON
        #[arg(long)]
        api_response: Option<String>,
        /// Domain knowledge text
        #[arg(long)]
        knowledge: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = resolve_config_dir(cli.config_dir.as_deref())
        .map_err(|e| flow_adapters::AdapterError::Config(e.to_string()))?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                let path = write_config(&config_dir)?;
                eprintln!(
                    "Configuration written to {}",
                    style(path.display()).green()
                );
            }
        }
        Commands::Get { key } => {
            get_key(&Config::load(&config_dir)?, &key).await?;
        }
        Commands::Docs { input } => {
            smart_documents(&Config::load(&config_dir)?, &input).await?;
        }
        Commands::Vector { input, k } => {
            vector(&Config::load(&config_dir)?, &input, k).await?;
        }
        Commands::Chat { session, user, ai } => {
            chat(
                &Config::load(&config_dir)?,
                session,
                user.as_deref(),
                ai.as_deref(),
            )
            .await?;
        }
        Commands::Convert { text } => {
            convert(&text)?;
        }
        Commands::Prompt {
            api_response,
            knowledge,
        } => {
            prompt(api_response.as_deref(), knowledge.as_deref())?;
        }
    }

    Ok(())
}
