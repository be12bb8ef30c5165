//! Promptwright CLI - inspect and maintain the prompt-authoring store.
//!
//! # Configuration
//!
//! Settings are resolved with priority:
//!
//! 1. CLI arguments (`--memory`, `--data`, `-v`, `-d`)
//! 2. Config file (`--config`, or `~/.config/promptwright/config.toml`)
//! 3. Default values (file store under the platform data directory)

mod app;
mod commands;
mod logging;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use promptwright_infrastructure::{AppConfig, DatabaseOptions};
use std::path::PathBuf;

/// Promptwright CLI
#[derive(Parser, Debug)]
#[command(name = "promptwright")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Store file path (overrides the config file)
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "memory")]
    data: Option<PathBuf>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    memory: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
    /// Manage wizard sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Manage artifacts
    Artifact {
        #[command(subcommand)]
        action: commands::artifact::ArtifactAction,
    },
    /// Show the assembled context of a project or artifact
    Context {
        #[command(subcommand)]
        action: commands::context::ContextAction,
    },
    /// Export a project as JSON
    Export {
        project_id: String,
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Import a project from an export file
    Import { file: PathBuf },
}

impl Args {
    fn database_options(&self, config: &AppConfig) -> Result<DatabaseOptions> {
        if self.memory {
            return Ok(DatabaseOptions::memory());
        }
        if let Some(path) = &self.data {
            return Ok(DatabaseOptions::file(path));
        }
        Ok(config.database_options()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let _log_guard = logging::init(args.debug, args.verbose, &config.logging);

    let options = args.database_options(&config)?;
    tracing::debug!(?options, "Opening store");
    let app = App::open(options).await.context("Failed to open store")?;

    let result = run(&app, args.command).await;
    app.close().await;
    result
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Project { action } => commands::project::run(app, action).await,
        Command::Session { action } => commands::session::run(app, action).await,
        Command::Artifact { action } => commands::artifact::run(app, action).await,
        Command::Context { action } => commands::context::run(app, action).await,
        Command::Export { project_id, output } => {
            commands::transfer::export(app, &project_id, output.as_deref()).await
        }
        Command::Import { file } => commands::transfer::import(app, &file).await,
    }
}
