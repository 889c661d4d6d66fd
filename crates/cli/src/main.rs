use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use yao_cli::{init_tracing, run, Cli, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(&cli).context("failed to load settings")?;

    init_tracing(&settings.log).context("failed to set up logging")?;
    debug!(?settings, "settings loaded");

    run::dispatch(&cli.command, &settings).await
}
