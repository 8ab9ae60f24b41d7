//! Kvikk - file-system routing and asset resolution for component web apps.

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use kvikk::cli::{self, Cli, Commands};
use kvikk::config::AppConfig;
use kvikk::core::{self, RuntimeMode};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = AppConfig::load(&cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        match &cli.command {
            Commands::Build => cli::build::build(&config).await,
            Commands::Routes { json } => cli::routes::list_routes(&config, *json).await,
            Commands::Resolve {
                kind,
                id,
                production,
            } => {
                let mode = RuntimeMode::from_production(*production);
                cli::resolve::resolve_asset(&config, *kind, id, mode).await
            }
            Commands::Watch => cli::watch::watch(&config).await,
        }
    })
}
