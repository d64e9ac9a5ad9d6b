//! PumpSwap single-pair trading bot
//!
//! # WARNING
//! - This bot trades with real money. Only use funds you can afford to lose.
//! - Thinly traded pairs can dump faster than any stop-loss can react.
//! - Testnet success does NOT equal mainnet success.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use pumpswap_trader::cli::commands;
use pumpswap_trader::config::Config;

/// PumpSwap single-pair trading bot
#[derive(Parser)]
#[command(name = "pumpswap-trader")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading loop
    Run,

    /// Show current configuration (secrets masked)
    Config,

    /// Check system health (RPC, pool, keypair)
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pumpswap_trader=info".parse().unwrap()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => commands::run(&config).await,
        Commands::Config => commands::show_config(&config),
        Commands::Health => commands::health(&config).await,
    };

    if let Err(e) = result {
        error!("Command failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}
