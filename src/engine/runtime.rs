// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::exec::TaskExecutor;
use crate::types::{RunOutcome, RunResult, WindowId};

use super::core::SupervisorCore;
use super::{CoreCommand, SupervisorEvent};

/// Drives the supervisor core in response to `SupervisorEvent`s,
/// and delegates actual process execution to a `TaskExecutor`.
///
/// This is a pure IO shell around `SupervisorCore`, which contains all the
/// debounce / rerun / cancellation semantics. This struct handles async IO:
/// reading events from the channel, sleeping until the debounce deadline,
/// dispatching runs to the executor and publishing results.
pub struct Runtime<E: TaskExecutor> {
    core: SupervisorCore,
    event_rx: mpsc::Receiver<SupervisorEvent>,
    executor: E,
    results_tx: mpsc::UnboundedSender<RunResult>,
    /// Armed debounce timer, if any.
    debounce: Option<(WindowId, Instant)>,
}

impl<E: TaskExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl<E: TaskExecutor> Runtime<E> {
    pub fn new(
        core: SupervisorCore,
        event_rx: mpsc::Receiver<SupervisorEvent>,
        executor: E,
        results_tx: mpsc::UnboundedSender<RunResult>,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            results_tx,
            debounce: None,
        }
    }

    /// Main event loop.
    ///
    /// - Starts the initial run.
    /// - Consumes `SupervisorEvent`s from `event_rx`, and synthesises
    ///   `DebounceElapsed` when the armed window closes.
    /// - Feeds them into the core and executes the returned commands.
    ///
    /// On exit the executor is shut down, which terminates any task that is
    /// still running and waits for it.
    pub async fn run(mut self) -> Result<()> {
        info!(debounce = ?self.core.debounce(), "supervisor runtime started");

        let step = self.core.bootstrap(Instant::now());
        let mut keep_running = step.keep_running;
        for command in step.commands {
            self.execute_command(command).await?;
        }

        while keep_running {
            let event = match self.next_event().await {
                Some(e) => e,
                None => {
                    info!("supervisor event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event, Instant::now());
            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                keep_running = false;
            }
        }

        // Late completions from the executor must not block on a full channel
        // nobody reads any more.
        self.event_rx.close();
        self.executor.shutdown().await?;

        info!("supervisor runtime exiting");
        Ok(())
    }

    /// Wait for the next event, or for the armed debounce deadline.
    async fn next_event(&mut self) -> Option<SupervisorEvent> {
        let Some((window, deadline)) = self.debounce else {
            return self.event_rx.recv().await;
        };

        tokio::select! {
            biased;
            event = self.event_rx.recv() => return event,
            _ = sleep_until(deadline) => {}
        }

        self.debounce = None;
        Some(SupervisorEvent::DebounceElapsed { window })
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::ArmDebounce { window, deadline } => {
                debug!(window, "arming debounce timer");
                self.debounce = Some((window, deadline));
            }
            CoreCommand::DisarmDebounce => {
                self.debounce = None;
            }
            CoreCommand::StartTask { run_id } => {
                info!(run_id, "starting run");
                self.executor.start(run_id).await?;
            }
            CoreCommand::CancelTask { run_id } => {
                self.executor.cancel(run_id).await?;
            }
            CoreCommand::EmitResult(result) => {
                self.publish(result);
            }
            CoreCommand::Exit => {
                // keep_running is already false in this case; just log it.
                info!("core issued Exit command");
            }
        }
        Ok(())
    }

    fn publish(&self, result: RunResult) {
        let elapsed = result.duration();
        match result.outcome {
            RunOutcome::Success => info!(
                run_id = result.run_id,
                ?elapsed,
                "run succeeded"
            ),
            RunOutcome::Failure => warn!(
                run_id = result.run_id,
                exit_status = ?result.exit_status,
                ?elapsed,
                "run failed"
            ),
            RunOutcome::Cancelled => info!(
                run_id = result.run_id,
                ?elapsed,
                "run cancelled"
            ),
        }

        if self.results_tx.send(result).is_err() {
            debug!("result receiver dropped; result discarded");
        }
    }
}
