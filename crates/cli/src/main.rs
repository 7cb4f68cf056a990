//! DocRelay CLI: the main entry point.
//!
//! Commands:
//! - `gateway` starts the HTTP API server
//! - `status`  shows configuration and provider credentials
//! - `models`  lists model profiles
//! - `docs`    adds, lists and removes stored documents
//! - `ask`     relays one prompt over stored documents

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "docrelay",
    about = "DocRelay: relay document prompts to LLM providers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration and provider status
    Status,

    /// List model profiles (built-in and configured)
    Models,

    /// Manage stored documents
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Relay one prompt over stored documents and print the answer
    Ask {
        /// Provider: openai, claude or custom
        #[arg(short, long)]
        api: String,

        /// Document id, in the order the documents should appear (repeatable)
        #[arg(short, long = "doc", required = true)]
        docs: Vec<String>,

        /// Prompt text (defaults to "Summarize")
        #[arg(short, long)]
        prompt: Option<String>,

        /// Requested output-token ceiling
        #[arg(short, long)]
        max_tokens: Option<u32>,

        /// Use this key instead of the operator key
        #[arg(long, env = "DOCRELAY_CALLER_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}

#[derive(Subcommand)]
enum DocsAction {
    /// Store plain-text files
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// MIME type recorded for every file
        #[arg(long)]
        mime_type: Option<String>,
    },

    /// List stored documents, newest first
    List,

    /// Delete documents by id
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Models => commands::models::run().await?,
        Commands::Docs { action } => match action {
            DocsAction::Add { files, mime_type } => commands::docs::add(&files, mime_type).await?,
            DocsAction::List => commands::docs::list().await?,
            DocsAction::Remove { ids } => commands::docs::remove(&ids).await?,
        },
        Commands::Ask {
            api,
            docs,
            prompt,
            max_tokens,
            api_key,
        } => {
            commands::ask::run(commands::ask::AskArgs {
                api,
                document_ids: docs,
                prompt,
                max_tokens,
                api_key,
            })
            .await?
        }
    }

    Ok(())
}
