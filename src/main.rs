//! CLI entry point for the modelfetch tool.

use anyhow::Result;
use clap::Parser;
use modelfetch_core::MirrorEnvironment;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

mod app_config;
mod cli;
mod commands;

use cli::{Cli, Command};
use commands::CommandContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    debug!(?cli, "CLI arguments parsed");

    let ctx = CommandContext {
        config: app_config::load_default_file_config()?,
        environment: MirrorEnvironment::from_process_env(),
        quiet: cli.quiet,
    };
    debug!(config = ?ctx.config, environment = ?ctx.environment, "Configuration loaded");

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling");
            signal_token.cancel();
        }
    });

    match &cli.command {
        Command::Fetch(args) => commands::run_fetch_command(&ctx, args, &cancel).await,
        Command::Probe(args) => commands::run_probe_command(&ctx, args, &cancel).await,
        Command::Mirrors(args) => commands::run_mirrors_command(&ctx, args),
    }
}
