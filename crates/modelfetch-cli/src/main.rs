//! CLI entry point - the composition root.
//!
//! Loads `.env`, parses arguments, initialises logging and dispatches to
//! the command handlers.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use modelfetch_cli::{Cli, Commands, folder_map, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads MODELFETCH_* values
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let folders = folder_map(&cli)?;

    match command {
        Commands::Serve(args) => handlers::serve::execute(args, folders).await?,
        Commands::Folders => handlers::folders::execute(&folders),
    }

    Ok(())
}
