//! Ironquill CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize config
//! - `chat`    — Interactive chat or single-message mode
//! - `status`  — Show configuration and endpoint health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ironquill",
    about = "Ironquill — a tool-using conversation runtime",
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
    /// Initialize configuration
    Onboard,

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Start a fresh conversation instead of restoring the saved session
        #[arg(long)]
        new: bool,
    },

    /// Show configuration and endpoint health
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await,
        Commands::Chat { message, new } => commands::chat::run(message, new).await,
        Commands::Status => commands::status::run().await,
    }
}
