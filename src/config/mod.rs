// src/config/mod.rs

//! Configuration loading and validation for simloop.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate globs, durations and command templates (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, project_root};
pub use model::{
    BuildSection, ConfigFile, ProjectSection, RawConfigFile, RawWatchSection, SimulatorSection,
    WatchConfig, WatchSection,
};
pub use validate::validate_watch_config;
