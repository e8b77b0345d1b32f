//! Storefront harness - application entry point
//!
//! CLI-based entry point that dispatches to the harness commands.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_harness::{
    cli::{Cli, Commands},
    commands,
    config::Config,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Verbose mode sets debug level
    init_tracing(cli.verbose);

    let config = Config::from_env();
    tracing::debug!(?config, "Configuration loaded");

    let result = match cli.command {
        Commands::Db(args) => commands::db::execute(args, config).await,
        Commands::Cache(args) => commands::cache::execute(args, config).await,
        Commands::Health => commands::health::execute(config).await,
        Commands::Session(args) => commands::session::execute(args, config).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(code = e.code(), "Command failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
