// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the task command using
//! `tokio::process::Command`, and reporting back to the supervisor via
//! `SupervisorEvent::TaskFinished`.
//!
//! - [`backend`] provides the `TaskExecutor` trait and the production
//!   `ProcessExecutor`, which tests can replace with a fake implementation.
//! - [`task_runner`] handles an individual task process.
//! - [`signal`] implements graceful termination with forced-kill escalation.

pub mod backend;
pub mod signal;
pub mod task_runner;

pub use backend::{ExecFuture, ProcessExecutor, TaskExecutor, TaskSpec};
