mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;

use strix_core::config::{self, Config};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    config::load_dotenv();
    let mut config = Config::from_env();
    args.apply_overrides(&mut config)
        .context("invalid command-line override")?;
    config.log_summary();

    commands::run(args.command, &config).await
}
