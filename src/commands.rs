// src/commands.rs

//! Subcommand workflows, composed from the toolchain collaborators and the
//! supervisor.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{ConfigFile, WatchConfig};
use crate::engine::Supervisor;
use crate::errors::{Result, SimloopError};
use crate::toolchain::{self, BootOutcome, ensure_success, require_command};
use crate::types::RunOutcome;

/// Loaded configuration plus the directory everything runs in.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config: ConfigFile,
    pub root: PathBuf,
}

impl Workspace {
    pub fn new(config: ConfigFile, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    /// The project reference (`[project].project`) resolved against the root.
    pub fn project_artifact(&self) -> PathBuf {
        self.root.join(&self.config.project.project)
    }
}

/// Fail with `MissingArtifact` unless the project reference exists.
pub fn require_project(ws: &Workspace) -> Result<()> {
    let artifact = ws.project_artifact();
    if artifact.exists() {
        Ok(())
    } else {
        Err(SimloopError::MissingArtifact(artifact))
    }
}

/// `simloop build`: build once.
pub async fn build(ws: &Workspace) -> Result<()> {
    require_command(&ws.config.build.command, &ws.root)?;
    require_project(ws)?;
    let status = toolchain::build(&ws.config, &ws.root).await?;
    ensure_success(status)?;
    info!("build succeeded");
    Ok(())
}

/// `simloop run`: build, boot the configured device, open the simulator.
pub async fn run(ws: &Workspace) -> Result<()> {
    let device = ws.config.project.device.clone().ok_or_else(|| {
        SimloopError::ConfigError("[project].device must be set for run / serve".to_string())
    })?;
    require_command(&ws.config.simulator.list_command, &ws.root)?;
    require_command(&ws.config.simulator.boot_command, &ws.root)?;
    require_command(&ws.config.simulator.open_command, &ws.root)?;

    build(ws).await?;

    match toolchain::boot(&ws.config, &ws.root, &device).await? {
        BootOutcome::AlreadyBooted => {}
        BootOutcome::Invoked(status) => ensure_success(status)?,
    }
    ensure_success(toolchain::open_simulator(&ws.config, &ws.root).await?)?;

    info!(device = %device, "app is running in the simulator");
    Ok(())
}

/// `simloop watch`: run the supervisor until Ctrl-C.
pub async fn watch(ws: &Workspace) -> Result<()> {
    supervise(ws, ws.config.watch_config(&ws.root)?).await
}

/// Run the supervisor until Ctrl-C.
async fn supervise(ws: &Workspace, watch_config: WatchConfig) -> Result<()> {
    require_command(watch_config.task_command(), &ws.root)?;
    require_project(ws)?;

    let mut supervisor = Supervisor::new(watch_config);
    let mut results = supervisor.start()?;
    info!("watching for changes; press Ctrl-C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = results.recv() => match result {
                Some(result) => {
                    if result.outcome == RunOutcome::Failure {
                        debug!(run_id = result.run_id, "watch continues after failed run");
                    }
                }
                None => {
                    warn!("supervisor exited unexpectedly");
                    break;
                }
            },
            signal = &mut ctrl_c => {
                if let Err(err) = signal {
                    warn!(error = %err, "failed to listen for Ctrl-C");
                }
                info!("Ctrl-C received; shutting down");
                break;
            }
        }
    }

    supervisor.stop().await
}

/// `simloop serve`: `run`, then `watch`.
///
/// When the watch task is the build command, `run` has just built, so the
/// supervisor skips its initial run.
pub async fn serve(ws: &Workspace) -> Result<()> {
    run(ws).await?;
    supervise(ws, serve_watch_config(ws)?).await
}

/// Watch input for `serve`.
pub fn serve_watch_config(ws: &Workspace) -> Result<WatchConfig> {
    let rebuilds_only = ws.config.watch.command.is_none();
    Ok(ws.config.watch_config(&ws.root)?.with_initial_run(!rebuilds_only))
}

/// `simloop clean`: run the clean command.
pub async fn clean(ws: &Workspace) -> Result<()> {
    require_command(&ws.config.build.clean_command, &ws.root)?;
    let status = toolchain::clean(&ws.config, &ws.root).await?;
    ensure_success(status)?;
    info!("clean succeeded");
    Ok(())
}

/// `simloop check`: verify every tool and the project artifact, and print
/// the effective configuration.
///
/// All problems are reported; the first one is returned as the error.
pub fn check(ws: &Workspace) -> Result<()> {
    print_config(ws);

    let mut problems = Vec::new();

    let commands: [(&str, &[String]); 5] = [
        ("build.command", ws.config.build.command.as_slice()),
        ("build.clean_command", ws.config.build.clean_command.as_slice()),
        ("simulator.list_command", ws.config.simulator.list_command.as_slice()),
        ("simulator.boot_command", ws.config.simulator.boot_command.as_slice()),
        ("simulator.open_command", ws.config.simulator.open_command.as_slice()),
    ];
    for (name, argv) in commands {
        match require_command(argv, &ws.root) {
            Ok(path) => println!("  ok       {name}: {}", path.display()),
            Err(err) => {
                println!("  missing  {name}: {err}");
                problems.push(err);
            }
        }
    }
    if let Some(argv) = &ws.config.watch.command {
        match require_command(argv, &ws.root) {
            Ok(path) => println!("  ok       watch.command: {}", path.display()),
            Err(err) => {
                println!("  missing  watch.command: {err}");
                problems.push(err);
            }
        }
    }

    match require_project(ws) {
        Ok(()) => println!("  ok       project: {}", ws.project_artifact().display()),
        Err(err) => {
            println!("  missing  project: {err}");
            problems.push(err);
        }
    }

    match problems.into_iter().next() {
        Some(err) => Err(err),
        None => {
            println!("all checks passed");
            Ok(())
        }
    }
}

/// Print the effective configuration.
fn print_config(ws: &Workspace) {
    let cfg = &ws.config;
    println!("simloop check");
    println!("  root = {}", ws.root.display());
    println!();

    println!("project:");
    println!("  project = {}", cfg.project.project);
    println!("  scheme = {}", cfg.project.scheme);
    println!("  configuration = {}", cfg.project.configuration);
    println!("  destination = {}", cfg.project.effective_destination());
    if let Some(device) = &cfg.project.device {
        println!("  device = {device}");
    }
    println!();

    println!("commands:");
    print_argv("build", &cfg.build.command);
    print_argv("clean", &cfg.build.clean_command);
    print_argv("list", &cfg.simulator.list_command);
    print_argv("boot", &cfg.simulator.boot_command);
    print_argv("open", &cfg.simulator.open_command);
    if let Some(command) = &cfg.watch.command {
        print_argv("watch", command);
    }
    println!();

    println!("watch:");
    println!("  paths = {:?}", cfg.watch.paths);
    if !cfg.watch.ignore.is_empty() {
        println!("  ignore = {:?}", cfg.watch.ignore);
    }
    println!("  debounce = {:?}", cfg.watch.debounce);
    println!("  grace_period = {:?}", cfg.watch.grace_period);
    if cfg.watch.skip_unchanged {
        println!("  skip_unchanged = true");
    }
    println!();

    debug!("configuration printed");
}

fn print_argv(label: &str, argv: &[String]) {
    println!("  {label}: {}", argv.join(" "));
}

/// Resolve the project root for `config_path` and bundle it with the config.
pub fn workspace_for(config: ConfigFile, config_path: &Path) -> Workspace {
    Workspace::new(config, crate::config::project_root(config_path))
}
