//! Hubblet CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Initialize config & data directory
//! - `list`: List saved assistants
//! - `create`: Configure a new assistant through the dialogue
//! - `edit`: Refine an existing assistant
//! - `ingest`: Add documents to an assistant's knowledge base
//! - `chat`: Chat with an assistant (interactive or single message)
//! - `sessions`: List chat sessions
//! - `config`: Show or validate configuration
//! - `doctor`: Diagnose system health

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "hubblet",
    about = "Hubblet — build custom assistants and chat with them over your documents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Who is chatting; memories and sessions are kept per user
    #[arg(short, long, global = true, env = "HUBBLET_USER", default_value = "default")]
    user: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directory
    Onboard,

    /// List saved assistants
    List,

    /// Create a new assistant through the configuration dialogue
    Create {
        /// Documents to add to the knowledge base on save
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,
    },

    /// Refine an existing assistant's instructions
    Edit {
        name: String,

        /// Documents to add to the knowledge base on save
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,
    },

    /// Add documents to an assistant's knowledge base
    Ingest {
        name: String,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Chat with an assistant
    Chat {
        name: String,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Start a new conversation instead of resuming the latest one
        #[arg(long)]
        new: bool,
    },

    /// List your chat sessions
    Sessions {
        /// Only sessions with this assistant
        assistant: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let user = &cli.user;
    tracing::debug!(user = %user, "Hubblet starting");
    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::List => commands::assistants::list().await?,
        Commands::Create { files } => commands::configure::create(&files).await?,
        Commands::Edit { name, files } => commands::configure::edit(&name, &files).await?,
        Commands::Ingest { name, files } => commands::assistants::ingest(&name, &files).await?,
        Commands::Chat { name, message, new } => {
            commands::chat::run(user, &name, message, new, cli.verbose).await?
        }
        Commands::Sessions { assistant, json } => {
            commands::sessions::run(user, assistant.as_deref(), json).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
