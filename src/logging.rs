//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level, `--debug` over both.

use anyhow::{Context, Result};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Install the global subscriber. Fails if one is already set.
pub fn init(config: &LoggingConfig, debug: bool) -> Result<()> {
    let filter = build_filter(config, debug, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;

    // stdout carries console replies
    let fmt_layer = layer().with_writer(std::io::stderr).with_target(true);
    let fmt_layer = match config.format.as_str() {
        "json" => fmt_layer.json().boxed(),
        _ => fmt_layer.pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to install tracing subscriber")
}

fn build_filter(config: &LoggingConfig, debug: bool, env: Option<String>) -> Result<EnvFilter> {
    let directives = if debug {
        "debug".to_string()
    } else {
        env.filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| config.level.clone())
    };
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter '{directives}'"))
}
