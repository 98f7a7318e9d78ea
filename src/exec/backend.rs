// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The runtime talks to a `TaskExecutor` instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation in [`ProcessExecutor`].
//!
//! Implementations report every started run back to the supervisor with
//! exactly one `SupervisorEvent::TaskFinished`.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::engine::SupervisorEvent;
use crate::errors::Result;
use crate::types::RunId;

use super::task_runner::run_task;

/// Future type returned by [`TaskExecutor`] methods.
pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Trait abstracting how task runs are executed.
///
/// Production code uses [`ProcessExecutor`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait TaskExecutor: Send {
    /// Begin run `run_id`. Must not block until the run finishes.
    fn start(&mut self, run_id: RunId) -> ExecFuture<'_>;

    /// Request termination of run `run_id` if it is still active.
    fn cancel(&mut self, run_id: RunId) -> ExecFuture<'_>;

    /// Terminate whatever is still running and wait for it to exit.
    fn shutdown(&mut self) -> ExecFuture<'_>;
}

/// What to run for each trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    pub grace_period: Duration,
}

impl TaskSpec {
    pub fn from_config(cfg: &WatchConfig) -> Self {
        Self {
            argv: cfg.task_command().to_vec(),
            cwd: cfg.root().to_path_buf(),
            grace_period: cfg.grace_period(),
        }
    }
}

/// Internal handle for the currently-running task process.
///
/// - `cancel` requests termination of the process.
/// - `handle` is the Tokio task that is actually running the command.
struct ActiveRun {
    run_id: RunId,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ActiveRun {
    fn request_cancel(&mut self) {
        match self.cancel.take() {
            Some(cancel) => {
                if cancel.send(()).is_err() {
                    debug!(run_id = self.run_id, "process already finished while cancelling");
                }
            }
            None => debug!(run_id = self.run_id, "cancellation already requested"),
        }
    }

    async fn join(self) {
        let run_id = self.run_id;
        if let Err(err) = self.handle.await {
            warn!(run_id, error = %err, "task runner ended abnormally");
        }
    }
}

/// Real executor used in production: one OS process per run, never two at
/// the same time.
pub struct ProcessExecutor {
    spec: Arc<TaskSpec>,
    events_tx: mpsc::Sender<SupervisorEvent>,
    active: Option<ActiveRun>,
}

impl std::fmt::Debug for ProcessExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessExecutor")
            .field("spec", &self.spec)
            .field("active_run", &self.active.as_ref().map(|a| a.run_id))
            .finish()
    }
}

impl Drop for ProcessExecutor {
    fn drop(&mut self) {
        // Dropping the runner drops its `Child`, and `kill_on_drop` does the rest.
        if let Some(active) = self.active.take() {
            active.handle.abort();
        }
    }
}

impl ProcessExecutor {
    pub fn new(spec: TaskSpec, events_tx: mpsc::Sender<SupervisorEvent>) -> Self {
        Self {
            spec: Arc::new(spec),
            events_tx,
            active: None,
        }
    }
}

impl TaskExecutor for ProcessExecutor {
    fn start(&mut self, run_id: RunId) -> ExecFuture<'_> {
        Box::pin(async move {
            if let Some(mut previous) = self.active.take() {
                if !previous.handle.is_finished() {
                    warn!(
                        previous = previous.run_id,
                        run_id, "previous process still alive; terminating it first"
                    );
                    previous.request_cancel();
                }
                previous.join().await;
            }

            let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
            let handle = tokio::spawn(run_task(
                Arc::clone(&self.spec),
                run_id,
                self.events_tx.clone(),
                cancel_rx,
            ));

            self.active = Some(ActiveRun {
                run_id,
                cancel: Some(cancel_tx),
                handle,
            });
            Ok(())
        })
    }

    fn cancel(&mut self, run_id: RunId) -> ExecFuture<'_> {
        Box::pin(async move {
            match self.active.as_mut() {
                Some(active) if active.run_id == run_id => {
                    info!(run_id, "cancelling task process");
                    active.request_cancel();
                }
                _ => debug!(run_id, "cancel for a run that is not active; ignoring"),
            }
            Ok(())
        })
    }

    fn shutdown(&mut self) -> ExecFuture<'_> {
        Box::pin(async move {
            if let Some(mut active) = self.active.take() {
                if !active.handle.is_finished() {
                    active.request_cancel();
                }
                active.join().await;
            }
            Ok(())
        })
    }
}
