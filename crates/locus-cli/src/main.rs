mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use locus_access::LocationAccessFacade;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    match &cli.command {
        Commands::Encode(args) => {
            commands::grants::encode(args, format)?;
        }
        Commands::List(args) => {
            let access = connect(&cli).await?;
            commands::directory::list(&access, args.refresh, format).await?;
        }
        Commands::Show(args) => {
            let access = connect(&cli).await?;
            commands::directory::show(&access, args.id, format).await?;
        }
        Commands::Check(args) => {
            let access = connect(&cli).await?;
            commands::grants::check(&access, args, format).await?;
        }
        Commands::Invalidate => {
            let access = connect(&cli).await?;
            commands::directory::invalidate(&access).await?;
        }
    }

    Ok(())
}

async fn connect(cli: &Cli) -> Result<LocationAccessFacade> {
    let config = config::load(cli.config.as_deref())?;
    observability::init_tracing_with_level(
        cli.log_level.as_deref().unwrap_or(&config.logging.level),
    );
    LocationAccessFacade::from_config(&config)
        .await
        .context("Failed to initialize location access")
}
