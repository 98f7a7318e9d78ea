// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SimloopError};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (globs, durations, commands). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        SimloopError::ConfigError(format!("cannot read config file {}: {e}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - missing project / scheme,
///   - empty or invalid watch globs,
///   - malformed durations,
///   - empty command templates,
///   - unknown `{placeholder}` names in command templates.
///
/// The configuration is loaded once at startup and never mutated afterwards.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Figure out the project root for a config path.
///
/// - If the config path has a non-empty parent (e.g. "ios/Simloop.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Simloop.toml" (parent = ""),
///   we fall back to the current working directory "."
pub fn project_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
