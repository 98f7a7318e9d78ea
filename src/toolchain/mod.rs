// src/toolchain/mod.rs

//! External collaborators: the build tool and the simulator utilities.
//!
//! Every invocation is an argv template from the config, expanded with
//! [`template::expand`] and run as an opaque process. Only exit status and
//! (for the device list) stdout are interpreted.

pub mod availability;
pub mod build;
pub mod simulator;
pub mod template;

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{Result, SimloopError};

pub use availability::{install_hint, require_command, require_tool};
pub use build::{build, clean};
pub use simulator::{boot, list_devices, open_simulator, parse_devices, BootOutcome, Device};
pub use template::{expand, TemplateVars};

fn split_argv(argv: &[String]) -> Result<(&String, &[String])> {
    argv.split_first()
        .ok_or_else(|| SimloopError::ConfigError("command is empty".to_string()))
}

/// Run `argv` in `cwd` with stdout/stderr passed through.
pub(crate) async fn run_tool(argv: &[String], cwd: &Path) -> Result<ExitStatus> {
    let (program, args) = split_argv(argv)?;
    debug!(cmd = %argv.join(" "), ?cwd, "running tool");

    let status = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .status()
        .await
        .with_context(|| format!("failed to run '{program}'"))?;

    debug!(program = %program, exit_code = ?status.code(), "tool exited");
    Ok(status)
}

/// Run `argv` in `cwd` and return its stdout. A non-zero exit is a
/// `TaskExecution` error.
pub(crate) async fn capture_tool(argv: &[String], cwd: &Path) -> Result<String> {
    let (program, args) = split_argv(argv)?;
    debug!(cmd = %argv.join(" "), ?cwd, "capturing tool output");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .await
        .with_context(|| format!("failed to run '{program}'"))?;

    ensure_success(output.status)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Map a non-zero exit status to `TaskExecution`.
pub fn ensure_success(status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(SimloopError::TaskExecution {
            code: status.code().unwrap_or(-1),
        })
    }
}
