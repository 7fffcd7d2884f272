use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use weatherbot::config::TransportKind;
use weatherbot::transport::{console, webhook};
use weatherbot::{BotConfig, WeatherBot, logging};

#[derive(Parser, Debug)]
#[command(name = "weatherbot", version, about = "Weather replies with satellite imagery")]
struct Cli {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = BotConfig::load_from_path(cli.config).context("Failed to load configuration")?;
    logging::init(&config.logging, cli.debug)?;

    info!(
        "Starting weatherbot {} with {:?} transport",
        weatherbot::VERSION,
        config.transport.kind
    );

    let bot = Arc::new(WeatherBot::from_config(&config)?);

    match config.transport.kind {
        TransportKind::Console => console::run(bot.as_ref(), &config.transport).await,
        TransportKind::Webhook => webhook::run(bot, &config.transport).await,
    }
}
