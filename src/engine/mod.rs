// src/engine/mod.rs

//! Watch-and-run supervisor.
//!
//! This module ties together:
//! - the debounce window (bursts of changes become one trigger)
//! - the single running task and its cancellation
//! - the "rerun owed" flag for triggers that arrive mid-run
//! - shutdown
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`], and [`supervisor`] is the public
//! `start` / `stop` handle wiring the shell to the watcher and executor.

use tokio::time::Instant;

use crate::types::{ChangeEvent, RunId, RunOutcome, WindowId};

/// Events flowing into the supervisor from the watcher, the executor and
/// the runtime's own debounce timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// A watched path changed.
    FileChanged(ChangeEvent),
    /// The debounce window with this id has expired.
    DebounceElapsed { window: WindowId },
    /// A task process exited (naturally, with failure, or after cancellation).
    TaskFinished {
        run_id: RunId,
        exit_status: Option<i32>,
        outcome: RunOutcome,
        finished_at: Instant,
    },
    /// Graceful shutdown requested (`stop`, Ctrl-C).
    StopRequested,
}

pub mod core;
pub mod runtime;
pub mod supervisor;

pub use self::core::{CoreCommand, CoreStep, PendingTrigger, RunningTask, SupervisorCore};
pub use runtime::Runtime;
pub use supervisor::Supervisor;
