use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::Instant;
use simloop::engine::SupervisorEvent;
use simloop::errors::Result;
use simloop::exec::{ExecFuture, TaskExecutor};
use simloop::types::{RunId, RunOutcome};

/// One call made on the fake executor, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorCall {
    Start(RunId),
    Cancel(RunId),
    Shutdown,
}

/// How the fake executor finishes runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeMode {
    /// Every started run reports `TaskFinished` with this outcome right away.
    CompleteImmediately(RunOutcome),
    /// Runs stay open until the test sends `TaskFinished` itself (see
    /// [`finished`]) or the run is cancelled.
    Manual,
    /// Like `Manual`, but cancellation is only recorded: the run keeps
    /// going until the test finishes it (a process ignoring SIGTERM).
    IgnoreCancel,
}

/// Shared record of executor calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<ExecutorCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<RunId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ExecutorCall::Start(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<RunId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ExecutorCall::Cancel(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: ExecutorCall) {
        self.0.lock().unwrap().push(call);
    }
}

/// A fake executor that:
/// - records which runs were started / cancelled
/// - reports `TaskFinished` according to its [`FakeMode`]
/// - answers a cancel with an immediate `Cancelled` completion.
pub struct FakeExecutor {
    events_tx: mpsc::Sender<SupervisorEvent>,
    mode: FakeMode,
    log: CallLog,
    active: Option<RunId>,
}

impl FakeExecutor {
    pub fn new(events_tx: mpsc::Sender<SupervisorEvent>, mode: FakeMode, log: CallLog) -> Self {
        Self {
            events_tx,
            mode,
            log,
            active: None,
        }
    }

    async fn report(&mut self, run_id: RunId, outcome: RunOutcome) -> Result<()> {
        self.active = None;
        // Closed during shutdown; nothing left to notify.
        let _ = self.events_tx.send(finished(run_id, outcome)).await;
        Ok(())
    }
}

impl TaskExecutor for FakeExecutor {
    fn start(&mut self, run_id: RunId) -> ExecFuture<'_> {
        Box::pin(async move {
            self.log.push(ExecutorCall::Start(run_id));
            self.active = Some(run_id);
            match self.mode {
                FakeMode::CompleteImmediately(outcome) => self.report(run_id, outcome).await,
                FakeMode::Manual | FakeMode::IgnoreCancel => Ok(()),
            }
        })
    }

    fn cancel(&mut self, run_id: RunId) -> ExecFuture<'_> {
        Box::pin(async move {
            self.log.push(ExecutorCall::Cancel(run_id));
            if self.active == Some(run_id) && self.mode != FakeMode::IgnoreCancel {
                self.report(run_id, RunOutcome::Cancelled).await?;
            }
            Ok(())
        })
    }

    fn shutdown(&mut self) -> ExecFuture<'_> {
        Box::pin(async move {
            self.log.push(ExecutorCall::Shutdown);
            self.active = None;
            Ok(())
        })
    }
}

/// `TaskFinished` for `run_id`, stamped now. Exit status follows the
/// outcome: `0` for success, `1` for failure, none when cancelled.
pub fn finished(run_id: RunId, outcome: RunOutcome) -> SupervisorEvent {
    let exit_status = match outcome {
        RunOutcome::Success => Some(0),
        RunOutcome::Failure => Some(1),
        RunOutcome::Cancelled => None,
    };
    SupervisorEvent::TaskFinished {
        run_id,
        exit_status,
        outcome,
        finished_at: Instant::now(),
    }
}
