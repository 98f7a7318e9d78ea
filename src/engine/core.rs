// src/engine/core.rs

//! Pure core state machine of the supervisor.
//!
//! This module contains a synchronous, deterministic "core" that consumes
//! [`SupervisorEvent`]s (plus the current time) and produces:
//! - an updated core state
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the channel
//! - arming the debounce timer
//! - starting and cancelling processes through a `TaskExecutor`
//! - publishing `RunResult`s
//!
//! The core has no channels, no Tokio tasks, no filesystem and no
//! processes, so every ordering rule can be tested by feeding it events.
//!
//! Invariants:
//! - at most one [`RunningTask`] exists;
//! - a debounce window is fixed from its first event and never extended;
//! - any number of triggers during a run owe exactly one rerun;
//! - the `RunResult` of a run is emitted before the next run starts.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::engine::SupervisorEvent;
use crate::types::{ChangeEvent, RunId, RunOutcome, RunResult, WindowId};

/// An open debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTrigger {
    pub window: WindowId,
    /// Timestamp of the first unconsumed event in this window.
    pub first_event_at: Instant,
    /// Events absorbed into the window after the first one.
    pub absorbed: usize,
}

impl PendingTrigger {
    pub fn deadline(&self, debounce: Duration) -> Instant {
        self.first_event_at + debounce
    }
}

/// The currently executing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningTask {
    pub run_id: RunId,
    pub started_at: Instant,
    /// Set once termination has been requested; never requested twice.
    pub cancel_requested: bool,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Fire `SupervisorEvent::DebounceElapsed { window }` at `deadline`.
    ArmDebounce { window: WindowId, deadline: Instant },
    /// Forget any armed debounce timer.
    DisarmDebounce,
    /// Spawn the task for a new run.
    StartTask { run_id: RunId },
    /// Ask the running task to terminate (graceful, then forced).
    CancelTask { run_id: RunId },
    /// Publish a finished run.
    EmitResult(RunResult),
    /// Stop the event loop.
    Exit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Pure supervisor state.
#[derive(Debug)]
pub struct SupervisorCore {
    debounce: Duration,
    pending: Option<PendingTrigger>,
    running: Option<RunningTask>,
    rerun_owed: bool,
    stopping: bool,
    bootstrapped: bool,
    initial_run: bool,
    next_run_id: RunId,
    next_window: WindowId,
}

impl SupervisorCore {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending: None,
            running: None,
            rerun_owed: false,
            stopping: false,
            bootstrapped: false,
            initial_run: true,
            next_run_id: 1,
            next_window: 1,
        }
    }

    /// Skip the initial run when `initial_run` is false; the first run then
    /// waits for the first debounced change.
    pub fn with_initial_run(mut self, initial_run: bool) -> Self {
        self.initial_run = initial_run;
        self
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn pending(&self) -> Option<&PendingTrigger> {
        self.pending.as_ref()
    }

    pub fn running(&self) -> Option<&RunningTask> {
        self.running.as_ref()
    }

    pub fn rerun_owed(&self) -> bool {
        self.rerun_owed
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    /// No task running, no window open, no rerun owed.
    pub fn is_idle(&self) -> bool {
        self.running.is_none() && self.pending.is_none() && !self.rerun_owed
    }

    /// Start the initial run ("build once before watching").
    ///
    /// Only the first call has an effect.
    pub fn bootstrap(&mut self, now: Instant) -> CoreStep {
        if self.bootstrapped || self.stopping {
            return CoreStep::running(Vec::new());
        }
        self.bootstrapped = true;
        if !self.initial_run {
            info!("initial run skipped; waiting for changes");
            return CoreStep::running(Vec::new());
        }
        info!("starting initial run");
        CoreStep::running(vec![self.start_task(now)])
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent, now: Instant) -> CoreStep {
        match event {
            SupervisorEvent::FileChanged(change) => self.on_change(change),
            SupervisorEvent::DebounceElapsed { window } => self.on_debounce_elapsed(window, now),
            SupervisorEvent::TaskFinished {
                run_id,
                exit_status,
                outcome,
                finished_at,
            } => self.on_task_finished(run_id, exit_status, outcome, finished_at, now),
            SupervisorEvent::StopRequested => self.on_stop(),
        }
    }

    fn on_change(&mut self, change: ChangeEvent) -> CoreStep {
        if self.stopping {
            debug!(path = ?change.path, "stopping; ignoring change");
            return CoreStep::running(Vec::new());
        }

        if let Some(pending) = self.pending.as_mut() {
            pending.absorbed += 1;
            debug!(
                path = ?change.path,
                window = pending.window,
                absorbed = pending.absorbed,
                "change absorbed into open debounce window"
            );
            return CoreStep::running(Vec::new());
        }

        let window = self.next_window;
        self.next_window += 1;
        let pending = PendingTrigger {
            window,
            first_event_at: change.timestamp,
            absorbed: 0,
        };
        let deadline = pending.deadline(self.debounce);
        self.pending = Some(pending);

        debug!(path = ?change.path, window, "opened debounce window");
        CoreStep::running(vec![CoreCommand::ArmDebounce { window, deadline }])
    }

    fn on_debounce_elapsed(&mut self, window: WindowId, now: Instant) -> CoreStep {
        match self.pending {
            Some(p) if p.window == window => {}
            _ => {
                debug!(window, "stale debounce timer; ignoring");
                return CoreStep::running(Vec::new());
            }
        }
        let pending = self.pending.take();
        debug!(?pending, "debounce window fired");

        match self.running.as_mut() {
            Some(task) => {
                self.rerun_owed = true;
                if task.cancel_requested {
                    debug!(
                        run_id = task.run_id,
                        "termination already in progress; rerun owed"
                    );
                    return CoreStep::running(Vec::new());
                }
                task.cancel_requested = true;
                info!(
                    run_id = task.run_id,
                    "changes detected while task is running; cancelling it"
                );
                CoreStep::running(vec![CoreCommand::CancelTask {
                    run_id: task.run_id,
                }])
            }
            None => CoreStep::running(vec![self.start_task(now)]),
        }
    }

    fn on_task_finished(
        &mut self,
        run_id: RunId,
        exit_status: Option<i32>,
        outcome: RunOutcome,
        finished_at: Instant,
        now: Instant,
    ) -> CoreStep {
        let task = match self.running {
            Some(task) if task.run_id == run_id => task,
            _ => {
                debug!(run_id, "completion for a run that is not current; ignoring");
                return CoreStep::running(Vec::new());
            }
        };
        self.running = None;

        // A run we asked to terminate is cancelled, whatever its exit code.
        let outcome = if task.cancel_requested && outcome != RunOutcome::Success {
            RunOutcome::Cancelled
        } else {
            outcome
        };

        let result = RunResult {
            run_id,
            started_at: task.started_at,
            finished_at,
            exit_status,
            outcome,
        };
        let mut commands = vec![CoreCommand::EmitResult(result)];

        if self.stopping {
            commands.push(CoreCommand::Exit);
            return CoreStep {
                commands,
                keep_running: false,
            };
        }

        if self.rerun_owed {
            self.rerun_owed = false;
            debug!(previous = run_id, "starting owed rerun");
            commands.push(self.start_task(now));
        }

        CoreStep::running(commands)
    }

    fn on_stop(&mut self) -> CoreStep {
        if self.stopping {
            return CoreStep::running(Vec::new());
        }
        self.stopping = true;
        self.rerun_owed = false;

        let mut commands = Vec::new();
        if self.pending.take().is_some() {
            commands.push(CoreCommand::DisarmDebounce);
        }

        match self.running.as_mut() {
            Some(task) => {
                info!(run_id = task.run_id, "stop requested; terminating running task");
                if !task.cancel_requested {
                    task.cancel_requested = true;
                    commands.push(CoreCommand::CancelTask {
                        run_id: task.run_id,
                    });
                }
                // Exit once the task reports back.
                CoreStep::running(commands)
            }
            None => {
                commands.push(CoreCommand::Exit);
                CoreStep {
                    commands,
                    keep_running: false,
                }
            }
        }
    }

    fn start_task(&mut self, now: Instant) -> CoreCommand {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.running = Some(RunningTask {
            run_id,
            started_at: now,
            cancel_requested: false,
        });
        CoreCommand::StartTask { run_id }
    }
}
