use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use market_tracker_lib::infrastructure::config::AppConfig;
use market_tracker_lib::infrastructure::{init_logging, log_system_info};

#[derive(Parser, Debug)]
#[command(
    name = "market-tracker",
    version,
    about = "Watches a storefront catalog for new arrivals and serves the latest snapshot"
)]
struct Cli {
    /// Config file (TOML); defaults to ./market-tracker.toml when present.
    #[arg(long, env = "MARKET_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    /// Run a single reconcile tick and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    init_logging(&config.logging)?;
    log_system_info();

    market_tracker_lib::run(config, cli.once).await
}
