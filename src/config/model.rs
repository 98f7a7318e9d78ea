// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::Result;
use crate::toolchain::template::{expand, TemplateVars};

/// Top-level configuration as read from `Simloop.toml`.
///
/// ```toml
/// [project]
/// project = "MyApp.xcodeproj"
/// scheme = "MyApp"
/// device = "iPhone 15"
///
/// [watch]
/// paths = ["MyApp/**/*.swift"]
/// ignore = ["build/**"]
/// debounce = "300ms"
/// ```
///
/// Only `[project]` and `[watch].paths` need to be filled in; the toolchain
/// sections default to an `xcodebuild` / `xcrun simctl` setup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub simulator: SimulatorSection,

    #[serde(default)]
    pub watch: RawWatchSection,
}

/// Validated configuration. Construct via `ConfigFile::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub build: BuildSection,
    pub simulator: SimulatorSection,
    pub watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        project: ProjectSection,
        build: BuildSection,
        simulator: SimulatorSection,
        watch: WatchSection,
    ) -> Self {
        Self {
            project,
            build,
            simulator,
            watch,
        }
    }
}

/// `[project]` section: the values substituted into toolchain templates.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    /// Project reference passed to the build tool (e.g. `MyApp.xcodeproj`),
    /// relative to the project root.
    #[serde(default)]
    pub project: String,

    /// Target / scheme name.
    #[serde(default)]
    pub scheme: String,

    #[serde(default = "default_configuration")]
    pub configuration: String,

    /// Explicit build destination. Derived from `device` when omitted.
    #[serde(default)]
    pub destination: Option<String>,

    /// Simulator device name used by `run` / `serve`.
    #[serde(default)]
    pub device: Option<String>,
}

fn default_configuration() -> String {
    "Debug".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            project: String::new(),
            scheme: String::new(),
            configuration: default_configuration(),
            destination: None,
            device: None,
        }
    }
}

impl ProjectSection {
    pub fn effective_destination(&self) -> String {
        match (&self.destination, &self.device) {
            (Some(dest), _) => dest.clone(),
            (None, Some(device)) => format!("platform=iOS Simulator,name={device}"),
            (None, None) => "generic/platform=iOS Simulator".to_string(),
        }
    }
}

/// `[build]` section: argv templates for the build tool.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    #[serde(default = "default_build_command")]
    pub command: Vec<String>,

    #[serde(default = "default_clean_command")]
    pub clean_command: Vec<String>,
}

fn xcodebuild_base() -> Vec<String> {
    [
        "xcodebuild",
        "-project",
        "{project}",
        "-scheme",
        "{scheme}",
        "-configuration",
        "{configuration}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_build_command() -> Vec<String> {
    let mut cmd = xcodebuild_base();
    cmd.extend(["-destination", "{destination}", "build"].map(String::from));
    cmd
}

fn default_clean_command() -> Vec<String> {
    let mut cmd = xcodebuild_base();
    cmd.push("clean".to_string());
    cmd
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            command: default_build_command(),
            clean_command: default_clean_command(),
        }
    }
}

/// `[simulator]` section: argv templates for simulator control.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorSection {
    #[serde(default = "default_list_command")]
    pub list_command: Vec<String>,

    #[serde(default = "default_boot_command")]
    pub boot_command: Vec<String>,

    #[serde(default = "default_open_command")]
    pub open_command: Vec<String>,
}

fn default_list_command() -> Vec<String> {
    ["xcrun", "simctl", "list", "devices"]
        .map(String::from)
        .to_vec()
}

fn default_boot_command() -> Vec<String> {
    ["xcrun", "simctl", "boot", "{device}"]
        .map(String::from)
        .to_vec()
}

fn default_open_command() -> Vec<String> {
    ["open", "-a", "Simulator"].map(String::from).to_vec()
}

impl Default for SimulatorSection {
    fn default() -> Self {
        Self {
            list_command: default_list_command(),
            boot_command: default_boot_command(),
            open_command: default_open_command(),
        }
    }
}

/// `[watch]` section as written in TOML (durations still strings).
#[derive(Debug, Clone, Deserialize)]
pub struct RawWatchSection {
    /// Globs (relative to the project root) whose changes trigger a run.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Globs whose changes are always ignored.
    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default = "default_debounce")]
    pub debounce: String,

    /// Time a cancelled task gets to exit after SIGTERM before SIGKILL.
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// Task argv. Defaults to the `[build].command` template.
    #[serde(default)]
    pub command: Option<Vec<String>>,

    /// Drop change events for files whose content hash did not change.
    #[serde(default)]
    pub skip_unchanged: bool,
}

fn default_debounce() -> String {
    "300ms".to_string()
}

fn default_grace_period() -> String {
    "2s".to_string()
}

impl Default for RawWatchSection {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            ignore: Vec::new(),
            debounce: default_debounce(),
            grace_period: default_grace_period(),
            command: None,
            skip_unchanged: false,
        }
    }
}

/// Validated `[watch]` section.
#[derive(Debug, Clone)]
pub struct WatchSection {
    pub paths: Vec<String>,
    pub ignore: Vec<String>,
    pub debounce: Duration,
    pub grace_period: Duration,
    pub command: Option<Vec<String>>,
    pub skip_unchanged: bool,
}

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Immutable input of the watch-and-run supervisor.
///
/// Paths and ignore globs are evaluated against paths relative to `root`,
/// which is also the working directory of the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    root: PathBuf,
    paths: Vec<String>,
    ignore: Vec<String>,
    debounce_interval: Duration,
    grace_period: Duration,
    task_command: Vec<String>,
    skip_unchanged: bool,
    initial_run: bool,
}

impl WatchConfig {
    pub fn new(
        root: impl Into<PathBuf>,
        paths: Vec<String>,
        task_command: Vec<String>,
    ) -> Self {
        Self {
            root: root.into(),
            paths,
            ignore: Vec::new(),
            debounce_interval: DEFAULT_DEBOUNCE,
            grace_period: DEFAULT_GRACE_PERIOD,
            task_command,
            skip_unchanged: false,
            initial_run: true,
        }
    }

    pub fn with_ignore(mut self, ignore: Vec<String>) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_debounce(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    pub fn with_skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }

    /// Whether `start` runs the task once before waiting for changes.
    /// On by default; `serve` turns it off when it has just built.
    pub fn with_initial_run(mut self, initial_run: bool) -> Self {
        self.initial_run = initial_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn ignore(&self) -> &[String] {
        &self.ignore
    }

    pub fn debounce_interval(&self) -> Duration {
        self.debounce_interval
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn task_command(&self) -> &[String] {
        &self.task_command
    }

    pub fn skip_unchanged(&self) -> bool {
        self.skip_unchanged
    }

    pub fn initial_run(&self) -> bool {
        self.initial_run
    }
}

impl ConfigFile {
    /// Template variables from `[project]`, for expanding toolchain argv.
    pub fn template_vars(&self) -> TemplateVars {
        TemplateVars::from_project(&self.project)
    }

    /// Build the supervisor input for `watch` / `serve`.
    ///
    /// The task is `[watch].command` when set, otherwise the build command.
    /// Placeholders are expanded here, so the result is fully concrete.
    pub fn watch_config(&self, root: &Path) -> Result<WatchConfig> {
        let vars = self.template_vars();
        let template = self.watch.command.as_ref().unwrap_or(&self.build.command);
        let task_command = expand(template, &vars)?;

        Ok(WatchConfig::new(root, self.watch.paths.clone(), task_command)
            .with_ignore(self.watch.ignore.clone())
            .with_debounce(self.watch.debounce)
            .with_grace_period(self.watch.grace_period)
            .with_skip_unchanged(self.watch.skip_unchanged))
    }
}
