// src/engine/supervisor.rs

//! Public `start` / `stop` handle around the runtime, the watcher and the
//! executor.

use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{validate_watch_config, WatchConfig};
use crate::errors::{Result, SimloopError};
use crate::exec::{ProcessExecutor, TaskExecutor, TaskSpec};
use crate::types::RunResult;
use crate::watch::{spawn_watcher, WatchFilter, WatcherHandle, WatcherOptions};

use super::core::SupervisorCore;
use super::runtime::Runtime;
use super::SupervisorEvent;

/// Capacity of the supervisor event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

enum State<E> {
    /// Constructed, not yet started.
    Idle {
        events_rx: mpsc::Receiver<SupervisorEvent>,
        executor: E,
    },
    /// Watcher and runtime loop are alive.
    Running {
        watcher: WatcherHandle,
        runtime: JoinHandle<Result<()>>,
    },
    /// `stop` completed; nothing is left alive.
    Stopped,
}

/// Watch-and-run supervisor.
///
/// `start` performs the initial run and then reruns the task command after
/// each debounced burst of changes under the configured paths. `stop`
/// terminates everything and waits for it.
///
/// Dropping a started supervisor without awaiting `stop` aborts the runtime
/// and kills the task process outright, skipping the grace period.
///
/// Must be used from within a Tokio runtime.
pub struct Supervisor<E: TaskExecutor + 'static = ProcessExecutor> {
    config: WatchConfig,
    events_tx: mpsc::Sender<SupervisorEvent>,
    state: State<E>,
}

impl<E: TaskExecutor + 'static> fmt::Debug for Supervisor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Idle { .. } => "idle",
            State::Running { .. } => "running",
            State::Stopped => "stopped",
        };
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field("state", &state)
            .finish()
    }
}

impl Supervisor<ProcessExecutor> {
    /// Supervisor running `config.task_command()` as a real OS process.
    pub fn new(config: WatchConfig) -> Self {
        let spec = TaskSpec::from_config(&config);
        Self::with_executor(config, move |events_tx| ProcessExecutor::new(spec, events_tx))
    }
}

impl<E: TaskExecutor + 'static> Supervisor<E> {
    /// Supervisor with a custom executor. `make_executor` receives the
    /// sender it must report `TaskFinished` events on.
    pub fn with_executor<F>(config: WatchConfig, make_executor: F) -> Self
    where
        F: FnOnce(mpsc::Sender<SupervisorEvent>) -> E,
    {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let executor = make_executor(events_tx.clone());
        Self {
            config,
            events_tx,
            state: State::Idle {
                events_rx,
                executor,
            },
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Sender into the supervisor event queue. Lets callers inject changes
    /// without touching the filesystem.
    pub fn event_sender(&self) -> mpsc::Sender<SupervisorEvent> {
        self.events_tx.clone()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// Begin monitoring and trigger the initial run (unless the config
    /// turned it off).
    ///
    /// Returns the stream of [`RunResult`]s, one per completed run.
    ///
    /// Errors:
    /// - `AlreadyRunning` if this handle was started before.
    /// - `ConfigError` for empty paths, invalid globs or an empty command.
    /// - `ToolUnavailable` if the OS file watcher cannot be initialised.
    pub fn start(&mut self) -> Result<mpsc::UnboundedReceiver<RunResult>> {
        if !matches!(self.state, State::Idle { .. }) {
            return Err(SimloopError::AlreadyRunning);
        }
        validate_watch_config(&self.config)?;

        let filter = WatchFilter::from_config(&self.config)?;
        let watcher = spawn_watcher(
            WatcherOptions {
                root: self.config.root().to_path_buf(),
                patterns: self.config.paths().to_vec(),
                filter,
                skip_unchanged: self.config.skip_unchanged(),
            },
            self.events_tx.clone(),
        )?;

        let (events_rx, executor) = match std::mem::replace(&mut self.state, State::Stopped) {
            State::Idle {
                events_rx,
                executor,
            } => (events_rx, executor),
            other => {
                self.state = other;
                return Err(SimloopError::AlreadyRunning);
            }
        };

        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let core = SupervisorCore::new(self.config.debounce_interval())
            .with_initial_run(self.config.initial_run());
        let runtime = Runtime::new(core, events_rx, executor, results_tx);
        let runtime = tokio::spawn(runtime.run());

        info!(
            root = ?self.config.root(),
            paths = ?self.config.paths(),
            cmd = %self.config.task_command().join(" "),
            "supervisor started"
        );

        self.state = State::Running { watcher, runtime };
        Ok(results_rx)
    }

    /// Stop watching, terminate any in-flight task and wait for both.
    ///
    /// Idempotent; a no-op before `start`.
    pub async fn stop(&mut self) -> Result<()> {
        let (mut watcher, runtime) =
            match std::mem::replace(&mut self.state, State::Stopped) {
                State::Running { watcher, runtime } => (watcher, runtime),
                State::Idle {
                    events_rx,
                    executor,
                } => {
                    debug!("stop before start; nothing to do");
                    self.state = State::Idle {
                        events_rx,
                        executor,
                    };
                    return Ok(());
                }
                State::Stopped => {
                    debug!("supervisor already stopped");
                    return Ok(());
                }
            };

        info!("stopping supervisor");
        watcher.shutdown().await;

        if self
            .events_tx
            .send(SupervisorEvent::StopRequested)
            .await
            .is_err()
        {
            debug!("runtime already exited before stop");
        }

        match runtime.await {
            Ok(result) => result?,
            Err(err) => {
                warn!(error = %err, "supervisor runtime task ended abnormally");
                return Err(anyhow::anyhow!("supervisor runtime panicked: {err}").into());
            }
        }

        info!("supervisor stopped");
        Ok(())
    }
}

impl<E: TaskExecutor + 'static> Drop for Supervisor<E> {
    fn drop(&mut self) {
        if let State::Running { runtime, .. } = &self.state {
            warn!("supervisor dropped while running; aborting without grace period");
            // The runtime owns the executor; dropping it kills the process.
            runtime.abort();
        }
    }
}
