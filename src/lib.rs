// src/lib.rs

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod toolchain;
pub mod types;
pub mod watch;

use std::path::PathBuf;

use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::commands::workspace_for;
use crate::config::load_and_validate;
use crate::errors::Result;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates `Simloop.toml`, resolves the project root and
/// dispatches to the subcommand workflow.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let ws = workspace_for(cfg, &config_path);
    debug!(command = ?args.command, root = ?ws.root, "dispatching");

    match args.command {
        Command::Build => commands::build(&ws).await,
        Command::Run => commands::run(&ws).await,
        Command::Watch => commands::watch(&ws).await,
        Command::Serve => commands::serve(&ws).await,
        Command::Clean => commands::clean(&ws).await,
        Command::Check => commands::check(&ws),
    }
}
