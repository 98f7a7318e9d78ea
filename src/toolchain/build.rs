// src/toolchain/build.rs

//! Build tool invocations (`[build]` section).

use std::path::Path;
use std::process::ExitStatus;

use tracing::info;

use crate::config::ConfigFile;
use crate::errors::Result;

use super::run_tool;
use super::template::expand;

/// Build the project once with `[build].command`.
///
/// Output is passed through live; the exit status is returned as-is.
pub async fn build(cfg: &ConfigFile, root: &Path) -> Result<ExitStatus> {
    let argv = expand(&cfg.build.command, &cfg.template_vars())?;
    info!(
        scheme = %cfg.project.scheme,
        configuration = %cfg.project.configuration,
        "building"
    );
    run_tool(&argv, root).await
}

/// Remove build products with `[build].clean_command`.
pub async fn clean(cfg: &ConfigFile, root: &Path) -> Result<ExitStatus> {
    let argv = expand(&cfg.build.clean_command, &cfg.template_vars())?;
    info!(scheme = %cfg.project.scheme, "cleaning");
    run_tool(&argv, root).await
}
