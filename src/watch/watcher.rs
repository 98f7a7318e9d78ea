// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::SupervisorEvent;
use crate::errors::{Result, SimloopError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::ChangeEvent;
use crate::watch::hash::ContentFilter;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::{collect_matching_files, watch_roots, WatchFilter};

/// Options for [`spawn_watcher`].
#[derive(Debug, Clone)]
pub struct WatcherOptions {
    /// Project root; globs are evaluated against paths relative to it.
    pub root: PathBuf,
    /// The watch globs, used to derive which directories to subscribe to.
    pub patterns: Vec<String>,
    pub filter: WatchFilter,
    pub skip_unchanged: bool,
}

/// Handle for the filesystem watcher.
///
/// Keeps the OS-level watcher alive. [`WatcherHandle::shutdown`] drops it
/// and waits for the forwarding task to finish.
pub struct WatcherHandle {
    inner: Option<RecommendedWatcher>,
    forwarder: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("active", &self.inner.is_some())
            .finish()
    }
}

impl WatcherHandle {
    /// Stop receiving notifications and wait for the forwarding task.
    pub async fn shutdown(&mut self) {
        // Dropping the watcher drops the notify callback and with it the
        // only sender of the forwarding channel, which ends the task.
        self.inner.take();
        if let Some(handle) = self.forwarder.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "watcher forwarding task ended abnormally");
            }
        }
        debug!("file watcher stopped");
    }
}

/// Spawn a filesystem watcher and forward filtered changes to the
/// supervisor as `SupervisorEvent::FileChanged`.
///
/// Initialisation failures of the notification backend (missing inotify
/// support, exhausted watch limits, ...) are reported as
/// `SimloopError::ToolUnavailable`.
pub fn spawn_watcher(
    options: WatcherOptions,
    events_tx: mpsc::Sender<SupervisorEvent>,
) -> Result<WatcherHandle> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    // Canonicalize once so we have a stable base path.
    let root = fs
        .canonicalize(&options.root)
        .unwrap_or_else(|_| options.root.clone());

    // Channel from the blocking notify callback into the async world.
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // The receiver is gone once the watcher is shutting down.
                let _ = raw_tx.send(event);
            }
            Err(err) => {
                eprintln!("simloop: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .map_err(notifier_unavailable)?;

    let roots = watch_roots(fs.as_ref(), &root, &options.patterns);
    for dir in &roots {
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(notifier_unavailable)?;
    }
    info!(?roots, "file watcher started");

    let mut content = if options.skip_unchanged {
        let mut filter = ContentFilter::new(Arc::clone(&fs));
        for dir in &roots {
            match collect_matching_files(fs.as_ref(), &root, dir, &options.filter) {
                Ok(files) => filter.seed(files),
                Err(err) => warn!(?dir, error = %err, "failed to collect files for hashing"),
            }
        }
        Some(filter)
    } else {
        None
    };

    let filter = options.filter;
    let forwarder = tokio::spawn(async move {
        while let Some(event) = raw_rx.recv().await {
            if !is_relevant(&event.kind) {
                continue;
            }
            debug!(?event, "received notify event");

            for path in event.paths {
                let Some(rel) = relative_str(&root, &path) else {
                    debug!(?path, "event outside the project root; ignoring");
                    continue;
                };
                if !filter.matches(&rel) {
                    continue;
                }
                if let Some(content) = content.as_mut() {
                    if !content.has_changed(&path) {
                        continue;
                    }
                }

                debug!(path = %rel, "watched path changed");
                let change = ChangeEvent::new(path, Instant::now());
                if events_tx
                    .send(SupervisorEvent::FileChanged(change))
                    .await
                    .is_err()
                {
                    // The supervisor loop has exited; nothing left to notify.
                    debug!("supervisor channel closed; watcher forwarding stops");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        inner: Some(watcher),
        forwarder: Some(forwarder),
    })
}

/// Access notifications (open/read/close-without-write) never change content.
fn is_relevant(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}

fn notifier_unavailable(err: notify::Error) -> SimloopError {
    SimloopError::tool_unavailable(
        "filesystem notifications",
        format!("Could not initialise the OS file watcher: {err}"),
    )
}
