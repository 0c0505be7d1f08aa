use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use party_dl::app::AppContext;
use party_dl::cli::{commands, Cli, Commands};
use party_dl::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Download {
            url,
            base_location,
            threads,
        } => {
            commands::download(&ctx, &url, base_location, threads).await?;
        }
        Commands::Stash {
            stash_host,
            content,
        } => {
            commands::stash(&ctx, stash_host, &content).await?;
        }
    }

    Ok(())
}
