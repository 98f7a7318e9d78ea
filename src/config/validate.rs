// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile, RawWatchSection, WatchConfig, WatchSection};
use crate::errors::{Result, SimloopError};
use crate::toolchain::template::{PLACEHOLDER_NAMES, placeholders};
use crate::types::parse_duration;
use crate::watch::patterns::build_globset;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SimloopError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let watch = validate_watch_section(&raw.watch)?;
        Ok(ConfigFile::new_unchecked(raw.project, raw.build, raw.simulator, watch))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_project(cfg)?;
    validate_template("[build].command", &cfg.build.command)?;
    validate_template("[build].clean_command", &cfg.build.clean_command)?;
    validate_template("[simulator].list_command", &cfg.simulator.list_command)?;
    validate_template("[simulator].boot_command", &cfg.simulator.boot_command)?;
    validate_template("[simulator].open_command", &cfg.simulator.open_command)?;
    if let Some(cmd) = &cfg.watch.command {
        validate_template("[watch].command", cmd)?;
    }
    Ok(())
}

/// A command template: a program name, and only placeholders we can expand.
fn validate_template(field: &str, argv: &[String]) -> Result<()> {
    validate_command(field, argv)?;
    match placeholders(argv)
        .into_iter()
        .find(|name| !PLACEHOLDER_NAMES.contains(&name.as_str()))
    {
        Some(name) => Err(SimloopError::ConfigError(format!(
            "{field} uses unknown placeholder {{{name}}} (expected one of: {})",
            PLACEHOLDER_NAMES.join(", ")
        ))),
        None => Ok(()),
    }
}

fn validate_project(cfg: &RawConfigFile) -> Result<()> {
    if cfg.project.project.trim().is_empty() {
        return Err(SimloopError::ConfigError(
            "[project].project must name the project file (e.g. \"App.xcodeproj\")".to_string(),
        ));
    }
    if cfg.project.scheme.trim().is_empty() {
        return Err(SimloopError::ConfigError(
            "[project].scheme must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_command(field: &str, argv: &[String]) -> Result<()> {
    match argv.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(SimloopError::ConfigError(format!(
            "{field} must contain at least a program name"
        ))),
    }
}

fn validate_watch_section(raw: &RawWatchSection) -> Result<WatchSection> {
    validate_watch_globs(&raw.paths, &raw.ignore)?;

    let debounce = parse_duration_field("[watch].debounce", &raw.debounce)?;
    ensure_positive("[watch].debounce", debounce)?;
    let grace_period = parse_duration_field("[watch].grace_period", &raw.grace_period)?;

    Ok(WatchSection {
        paths: raw.paths.clone(),
        ignore: raw.ignore.clone(),
        debounce,
        grace_period,
        command: raw.command.clone(),
        skip_unchanged: raw.skip_unchanged,
    })
}

fn parse_duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| SimloopError::ConfigError(format!("{field}: {e}")))
}

fn ensure_positive(field: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(SimloopError::ConfigError(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(())
}

fn validate_watch_globs(paths: &[String], ignore: &[String]) -> Result<()> {
    if paths.is_empty() {
        return Err(SimloopError::ConfigError(
            "watch paths must contain at least one glob".to_string(),
        ));
    }
    build_globset(paths)
        .map_err(|e| SimloopError::ConfigError(format!("invalid watch path: {e:#}")))?;
    build_globset(ignore)
        .map_err(|e| SimloopError::ConfigError(format!("invalid ignore glob: {e:#}")))?;
    Ok(())
}

/// Check a [`WatchConfig`] before the supervisor starts.
///
/// `WatchConfig` can be built by hand, so the supervisor repeats the checks
/// the TOML loader already performs.
pub fn validate_watch_config(cfg: &WatchConfig) -> Result<()> {
    validate_watch_globs(cfg.paths(), cfg.ignore())?;
    validate_command("task command", cfg.task_command())?;
    ensure_positive("debounce interval", cfg.debounce_interval())?;
    Ok(())
}
