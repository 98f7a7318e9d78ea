// src/exec/task_runner.rs

//! Individual task process runner.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use anyhow::Context;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::engine::SupervisorEvent;
use crate::errors::{Result, SimloopError};
use crate::exec::backend::TaskSpec;
use crate::exec::signal::terminate;
use crate::types::{RunId, RunOutcome};

/// Run a single task process and report exactly one `TaskFinished` event.
///
/// - stdout / stderr are inherited, so the caller sees output live.
/// - A non-zero exit is a `Failure`; a spawn error is a `Failure` without
///   an exit status.
/// - If the cancel channel fires (or its sender is dropped) the process is
///   terminated gracefully and the run is reported as `Cancelled`.
pub async fn run_task(
    spec: Arc<TaskSpec>,
    run_id: RunId,
    events_tx: mpsc::Sender<SupervisorEvent>,
    cancel_rx: oneshot::Receiver<()>,
) {
    let (exit_status, outcome) = match run_process(&spec, run_id, cancel_rx).await {
        Ok(status) if status.success() => (status.code(), RunOutcome::Success),
        Ok(status) => {
            let code = status.code();
            let err = SimloopError::TaskExecution {
                code: code.unwrap_or(-1),
            };
            warn!(run_id, exit_code = ?code, "{err}");
            (code, RunOutcome::Failure)
        }
        Err(SimloopError::Cancelled) => {
            info!(run_id, "task process terminated after cancellation");
            (None, RunOutcome::Cancelled)
        }
        Err(err) => {
            error!(run_id, error = %err, "task execution error");
            (None, RunOutcome::Failure)
        }
    };

    let finished = SupervisorEvent::TaskFinished {
        run_id,
        exit_status,
        outcome,
        finished_at: Instant::now(),
    };
    if events_tx.send(finished).await.is_err() {
        // Supervisor already gone (shutting down); the process is reaped.
        info!(run_id, %outcome, "task finished after supervisor exit");
    }
}

async fn run_process(
    spec: &TaskSpec,
    run_id: RunId,
    mut cancel_rx: oneshot::Receiver<()>,
) -> Result<ExitStatus> {
    let (program, args) = spec
        .argv
        .split_first()
        .ok_or_else(|| SimloopError::ConfigError("task command is empty".to_string()))?;

    info!(
        run_id,
        cmd = %spec.argv.join(" "),
        cwd = ?spec.cwd,
        "starting task process"
    );

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(&spec.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning task process '{program}'"))?;

    // Either the process exits on its own (normal case), or we receive a
    // cancellation request (superseded run or shutdown).
    tokio::select! {
        status = child.wait() => {
            let status = status.with_context(|| format!("waiting for task process '{program}'"))?;
            info!(
                run_id,
                exit_code = ?status.code(),
                success = status.success(),
                "task process exited"
            );
            Ok(status)
        }
        _ = &mut cancel_rx => {
            let status = terminate(&mut child, spec.grace_period)
                .await
                .with_context(|| format!("terminating task process '{program}'"))?;
            info!(run_id, exit_code = ?status.code(), "task process terminated");
            Err(SimloopError::Cancelled)
        }
    }
}
