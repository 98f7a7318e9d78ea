#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use simloop::config::{ConfigFile, RawConfigFile, WatchConfig};
use simloop::errors::Result;

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from a minimal valid config: project `App.xcodeproj`, scheme
/// `App`, watching `src/**`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.project.project = "App.xcodeproj".to_string();
        config.project.scheme = "App".to_string();
        config.watch.paths = vec!["src/**".to_string()];
        Self { config }
    }

    pub fn project(mut self, project: &str) -> Self {
        self.config.project.project = project.to_string();
        self
    }

    pub fn scheme(mut self, scheme: &str) -> Self {
        self.config.project.scheme = scheme.to_string();
        self
    }

    pub fn device(mut self, device: &str) -> Self {
        self.config.project.device = Some(device.to_string());
        self
    }

    pub fn build_command(mut self, cmd: &[&str]) -> Self {
        self.config.build.command = argv(cmd);
        self
    }

    pub fn clean_command(mut self, cmd: &[&str]) -> Self {
        self.config.build.clean_command = argv(cmd);
        self
    }

    pub fn list_command(mut self, cmd: &[&str]) -> Self {
        self.config.simulator.list_command = argv(cmd);
        self
    }

    pub fn boot_command(mut self, cmd: &[&str]) -> Self {
        self.config.simulator.boot_command = argv(cmd);
        self
    }

    pub fn open_command(mut self, cmd: &[&str]) -> Self {
        self.config.simulator.open_command = argv(cmd);
        self
    }

    /// Replace the watch globs.
    pub fn watch_paths(mut self, patterns: &[&str]) -> Self {
        self.config.watch.paths = argv(patterns);
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.watch.ignore.push(pattern.to_string());
        self
    }

    pub fn debounce(mut self, value: &str) -> Self {
        self.config.watch.debounce = value.to_string();
        self
    }

    pub fn grace_period(mut self, value: &str) -> Self {
        self.config.watch.grace_period = value.to_string();
        self
    }

    pub fn watch_command(mut self, cmd: &[&str]) -> Self {
        self.config.watch.command = Some(argv(cmd));
        self
    }

    pub fn skip_unchanged(mut self, val: bool) -> Self {
        self.config.watch.skip_unchanged = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `WatchConfig` rooted at `root` with a short debounce, suitable for
/// real-process tests.
pub fn watch_config(root: &Path, paths: &[&str], cmd: &[&str]) -> WatchConfig {
    WatchConfig::new(root, argv(paths), argv(cmd))
        .with_debounce(Duration::from_millis(200))
        .with_grace_period(Duration::from_secs(2))
}
