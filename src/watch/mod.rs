// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the `paths` / `ignore` glob patterns.
//! - Deriving which directories to subscribe to.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - (Optionally) dropping events for files whose content did not change.
//!
//! It knows nothing about debouncing or tasks; it only turns filesystem
//! notifications into [`crate::types::ChangeEvent`]s.

pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use hash::ContentFilter;
pub use patterns::{build_globset, watch_roots, WatchFilter};
pub use watcher::{spawn_watcher, WatcherHandle, WatcherOptions};
