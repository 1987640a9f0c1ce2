//! actionstage CLI — the main entry point.
//!
//! Commands:
//! - `gateway`  — Start the HTTP server
//! - `extract`  — Stage actions from a transcript file
//! - `config`   — Print the default configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "actionstage",
    about = "Stage LLM-proposed actions from a meeting transcript for human review",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run extraction over a /GetTodos-shaped JSON file and print the staged actions
    Extract {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the default configuration TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Gateway { port } => commands::gateway::run(port).await?,
        Commands::Extract { file } => commands::extract::run(&file).await?,
        Commands::Config => commands::config_cmd::show(),
    }

    Ok(())
}
