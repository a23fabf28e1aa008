//! SMS Agent Stack CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the webhook gateway
//! - `ask`     — Run one message through the pipeline
//! - `search`  — Query the knowledge base
//! - `ping`    — Test connectivity to the completion API
//! - `status`  — Show configuration and knowledge base status
//! - `doctor`  — Check credentials and the documents directory

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "smsagent",
    about = "SMS Agent Stack — an AI assistant for SMS and Slack",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.smsagent/config.toml)
    #[arg(short, long, global = true, env = "SMSAGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP webhook gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send one message through the pipeline and print the reply
    Ask {
        message: String,

        /// Sender id used in the prompt
        #[arg(short, long, default_value = "cli")]
        from: String,

        /// Model tier (fast, balanced, premium, smart) or a raw model id
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Search the knowledge base
    Search {
        query: String,

        #[arg(short = 'n', long)]
        max_results: Option<usize>,
    },

    /// Test connectivity to the completion API
    Ping,

    /// Show system status
    Status,

    /// Diagnose configuration
    Doctor,
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

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Ask {
            message,
            from,
            model,
        } => commands::ask::run(config_path, &message, &from, model.as_deref()).await?,
        Commands::Search { query, max_results } => {
            commands::search::run(config_path, &query, max_results)?
        }
        Commands::Ping => commands::ping::run(config_path).await?,
        Commands::Status => commands::status::run(config_path)?,
        Commands::Doctor => commands::doctor::run(config_path)?,
    }

    Ok(())
}
