// src/exec/signal.rs

//! Graceful process termination: SIGTERM, grace period, then SIGKILL.
//!
//! Task processes are spawned as leaders of their own process group, so the
//! signals reach whatever the task forked (shell pipelines, compiler
//! workers) and not only the direct child. The group is swept after the
//! leader is reaped: members still alive at the end of the grace period are
//! killed too.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::{Instant, timeout_at};
use tracing::warn;

/// Terminate `child` and its process group, escalating to a forced kill
/// after `grace`, and reap the leader.
///
/// Returns the exit status of the reaped leader. When this returns, no
/// member of the group outlives the grace period.
pub async fn terminate(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    // `Child::id` is gone once the leader is reaped.
    let group = child.id();
    let deadline = Instant::now() + grace;

    request_termination(child, group);

    let status = match timeout_at(deadline, child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            warn!(
                pid = group,
                grace_ms = grace.as_millis() as u64,
                "process ignored termination request; killing it"
            );
            force_kill(child, group);
            child.wait().await?
        }
    };

    sweep_group(group, deadline).await;
    Ok(status)
}

#[cfg(unix)]
fn request_termination(child: &mut Child, group: Option<u32>) {
    use nix::sys::signal::Signal;

    if !group.is_some_and(|pgid| group_unix::signal(pgid, Signal::SIGTERM)) {
        // No group to signal; fall back to the direct child.
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child, _group: Option<u32>) {
    // No termination signal on this platform; the grace period is skipped.
    let _ = child.start_kill();
}

#[cfg(unix)]
fn force_kill(child: &mut Child, group: Option<u32>) {
    use nix::sys::signal::Signal;

    if let Some(pgid) = group {
        group_unix::signal(pgid, Signal::SIGKILL);
    }
    let _ = child.start_kill();
}

#[cfg(not(unix))]
fn force_kill(child: &mut Child, _group: Option<u32>) {
    let _ = child.start_kill();
}

/// Wait until the rest of the group has exited or `deadline` passes, then
/// SIGKILL whatever is left.
#[cfg(unix)]
async fn sweep_group(group: Option<u32>, deadline: Instant) {
    use nix::sys::signal::Signal;

    const POLL: Duration = Duration::from_millis(25);

    let Some(pgid) = group else {
        return;
    };
    while group_unix::is_alive(pgid) {
        if Instant::now() >= deadline {
            warn!(pgid, "process group outlived its leader; killing it");
            group_unix::signal(pgid, Signal::SIGKILL);
            return;
        }
        tokio::time::sleep(POLL).await;
    }
}

#[cfg(not(unix))]
async fn sweep_group(_group: Option<u32>, _deadline: Instant) {}

#[cfg(unix)]
mod group_unix {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;
    use tracing::{debug, warn};

    /// Send `signal` to the process group `pgid`.
    ///
    /// Returns false when the group no longer exists.
    pub(super) fn signal(pgid: u32, signal: Signal) -> bool {
        match killpg(Pid::from_raw(pgid as i32), signal) {
            Ok(()) => {
                debug!(pgid, ?signal, "signalled process group");
                true
            }
            Err(Errno::ESRCH) => false,
            Err(err) => {
                warn!(pgid, ?signal, error = %err, "failed to signal process group");
                false
            }
        }
    }

    /// Whether any process is left in group `pgid`.
    pub(super) fn is_alive(pgid: u32) -> bool {
        match killpg(Pid::from_raw(pgid as i32), None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }
}
