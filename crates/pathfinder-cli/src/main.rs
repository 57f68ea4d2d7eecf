//! Pathfinder CLI
//!
//! Starts business analysis sessions and inspects the ones on disk.

mod args;
mod cli;
mod renderer;

use std::time::Duration;

use anyhow::{Context, Result};
use args::{Args, Commands, SessionCommands};
use clap::Parser;
use cli::Cli;
use log::info;
use pathfinder_core::{EngineBuilder, StageSet, params::ListSessions};
use renderer::TerminalRenderer;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        command,
    } = Args::parse();

    let stages = match &command {
        Some(Commands::Session {
            command: SessionCommands::Start(start),
        }) => StageSet::offline(Duration::from_millis(start.stage_delay_ms)),
        _ => StageSet::default(),
    };

    let engine = EngineBuilder::new()
        .with_database_path(database_file)
        .with_analyzers(stages)
        .build()
        .await
        .context("Failed to initialize session engine")?;

    info!("Pathfinder started with database {}", engine.db_path().display());

    let cli = Cli::new(engine, TerminalRenderer::new(!no_color));
    match command {
        Some(Commands::Session { command }) => cli.handle_session_command(command).await,
        Some(Commands::Stats) => cli.stats().await,
        None => cli.list(&ListSessions::default()).await,
    }
}
