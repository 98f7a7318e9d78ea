// src/types.rs

//! Small value types shared by the watcher, the supervisor core and the
//! executor.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

/// Monotonic identifier of a task run. The initial run is `1`.
pub type RunId = u64;

/// Identifier of a debounce window. Used to recognise stale timers.
pub type WindowId = u64;

/// How a task run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure,
    /// The run was superseded by a newer trigger or interrupted by `stop`.
    Cancelled,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunOutcome::Success => "success",
            RunOutcome::Failure => "failure",
            RunOutcome::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Emitted once per completed task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub run_id: RunId,
    pub started_at: Instant,
    pub finished_at: Instant,
    /// Exit code of the process; `None` if it never started or was killed
    /// by a signal.
    pub exit_status: Option<i32>,
    pub outcome: RunOutcome,
}

impl RunResult {
    pub fn duration(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }
}

/// A single filesystem change that survived path filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub timestamp: Instant,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, timestamp: Instant) -> Self {
        Self {
            path: path.into(),
            timestamp,
        }
    }
}

/// Parse a simple duration string like `"300ms"`, `"2s"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
