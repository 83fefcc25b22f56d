//! Conclave CLI — the main entry point.
//!
//! Commands:
//! - `run`          — Put a prompt to a society of agents
//! - `onboard`      — Write the default config file
//! - `capabilities` — List the configured capabilities

use clap::{Parser, Subcommand};
use conclave_core::Mode;

mod commands;

#[derive(Parser)]
#[command(
    name = "conclave",
    about = "Conclave — a society of agents answering one prompt together",
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
    /// Run the agents on a prompt
    Run {
        /// Orchestration mode: standard, synthesis or collaborative
        #[arg(short, long)]
        mode: Option<Mode>,

        /// Number of agents (overrides the config file)
        #[arg(short, long)]
        agents: Option<usize>,

        /// Bind every agent to the first capability
        #[arg(long)]
        single_capability: bool,

        /// The prompt; a built-in example is used when omitted
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Initialize configuration
    Onboard,

    /// Show configured capabilities
    Capabilities,
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

    match cli.command {
        Commands::Run {
            mode,
            agents,
            single_capability,
            prompt,
        } => {
            let args = commands::run::RunArgs {
                mode,
                agents,
                single_capability,
                prompt,
            };
            commands::run::run(args).await?
        }
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Capabilities => commands::capabilities::run().await?,
    }

    Ok(())
}
