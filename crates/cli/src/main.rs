mod cli;
mod commands;
mod config;

use clap::Parser;
use cloudacct_account::ConfigStore;
use tracing_subscriber::EnvFilter;

use crate::cli::Commands;
use crate::commands::handle_account_command;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_dir = config::resolve_config_dir(cli.config_dir);
    tracing::debug!("Using configuration directory {}", config_dir.display());
    let store = ConfigStore::new(config_dir);

    // Populated once here and passed down; nothing else adds to it.
    let registry = config::known_resource_types();

    match cli.command {
        Commands::Account { command } => {
            handle_account_command(command, &store, &registry).await?;
        }
    }

    Ok(())
}
