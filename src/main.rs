use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sitewatch::cli::{commands, Cli, Commands};
use sitewatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => {
            commands::run(config).await?;
        }
        Commands::Sweep => {
            commands::sweep_once(config).await?;
        }
        Commands::Sites => {
            commands::list_sites(config).await?;
        }
    }

    Ok(())
}
