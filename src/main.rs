//! Peak Align CLI
//!
//! Command-line interface for transient alignment of session items.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use peak_align::cli::commands::{self, AlignOptions};
use peak_align::cli::{Cli, Commands};
use peak_align::AlignConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Peak Align v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => AlignConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AlignConfig::default(),
    };

    match cli.command {
        Some(cmd) => handle_command(cmd, &config),
        None => {
            println!("Peak Align v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &AlignConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Peak { path } => {
            commands::peak(&path, config)
                .with_context(|| format!("scanning {}", path.display()))?;
        }
        Commands::Inspect { session } => {
            commands::inspect(&session)
                .with_context(|| format!("inspecting {}", session.display()))?;
        }
        Commands::Align {
            session,
            target,
            hover,
            select,
            output,
            json,
        } => {
            let options = AlignOptions {
                target,
                hover,
                select,
                output,
                json,
            };
            commands::align(&session, &options, config)
                .with_context(|| format!("aligning {}", session.display()))?;
        }
    }
    Ok(())
}
