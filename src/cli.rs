// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `simloop`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "simloop",
    version,
    about = "Build, launch and live-rebuild a simulator app project.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Simloop.toml` in the current working directory. Its
    /// directory is the project root.
    #[arg(long, global = true, value_name = "PATH", default_value = "Simloop.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SIMLOOP_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Build the project once.
    Build,
    /// Rebuild whenever watched files change, until Ctrl-C.
    Watch,
    /// Build, launch in the simulator, then keep rebuilding on change.
    Serve,
    /// Build, boot the configured device and open the simulator.
    Run,
    /// Remove build products.
    Clean,
    /// Verify tools and project files, and print the effective config.
    Check,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
