// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimloopError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A required external tool (or OS facility) is missing.
    #[error("{tool} is not available. {hint}")]
    ToolUnavailable { tool: String, hint: String },

    #[error("Supervisor is already running")]
    AlreadyRunning,

    /// The invoked task exited with a non-zero status.
    #[error("Task failed with exit code {code}")]
    TaskExecution { code: i32 },

    /// A run was deliberately superseded or stopped. Never surfaced as a
    /// failure to the user.
    #[error("Task run was cancelled")]
    Cancelled,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Missing project artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimloopError {
    pub fn tool_unavailable(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        SimloopError::ToolUnavailable {
            tool: tool.into(),
            hint: hint.into(),
        }
    }

    /// Process exit code used by `main` for this error.
    ///
    /// Task failures propagate the tool's own code when it is a usable
    /// non-zero value; everything else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            SimloopError::TaskExecution { code } if *code > 0 => *code,
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SimloopError>;
