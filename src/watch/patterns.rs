// src/watch/patterns.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::WatchConfig;
use crate::fs::FileSystem;

/// Compiled watch/ignore glob patterns.
///
/// The patterns are relative to the project root. The watcher passes
/// relative, forward-slash paths (e.g. `"src/main.swift"`) into `matches`.
#[derive(Clone)]
pub struct WatchFilter {
    watch_set: GlobSet,
    ignore_set: Option<GlobSet>,
}

impl fmt::Debug for WatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchFilter")
            .field("watch_globs", &self.watch_set.len())
            .field(
                "ignore_globs",
                &self.ignore_set.as_ref().map_or(0, GlobSet::len),
            )
            .finish()
    }
}

impl WatchFilter {
    pub fn new(paths: &[String], ignore: &[String]) -> Result<Self> {
        let watch_set = build_globset(paths).context("building watch globset")?;
        let ignore_set = if ignore.is_empty() {
            None
        } else {
            Some(build_globset(ignore).context("building ignore globset")?)
        };
        Ok(Self {
            watch_set,
            ignore_set,
        })
    }

    pub fn from_config(cfg: &WatchConfig) -> Result<Self> {
        Self::new(cfg.paths(), cfg.ignore())
    }

    /// True when `rel_path` is watched and not ignored.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(ignore) = &self.ignore_set {
            if ignore.is_match(rel_path) {
                return false;
            }
        }
        true
    }

    pub fn is_ignored(&self, rel_path: &str) -> bool {
        self.ignore_set
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Leading directory components of `pattern` that contain no glob syntax.
///
/// `"src/**"` gives `"src"`, `"Sources/App/*.swift"` gives `"Sources/App"`,
/// `"**/*.swift"` gives `""`. A pattern without any glob syntax is a literal
/// file or directory; its parent is used so that creation of the path is
/// observed too.
pub fn literal_prefix(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').collect();
    let mut prefix = PathBuf::new();
    let last = components.len().saturating_sub(1);

    for (i, part) in components.iter().enumerate() {
        if part.chars().any(|c| matches!(c, '*' | '?' | '[' | '{')) || i == last {
            break;
        }
        if !part.is_empty() && *part != "." {
            prefix.push(part);
        }
    }
    prefix
}

/// Directories to subscribe to, derived from the watch globs.
///
/// Each root is the literal prefix of a pattern resolved against `root`;
/// prefixes that do not exist yet fall back to their nearest existing
/// ancestor (never above `root`). Roots nested inside another root are
/// dropped since every subscription is recursive.
pub fn watch_roots(fs: &dyn FileSystem, root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = patterns
        .iter()
        .map(|pat| nearest_existing_dir(fs, root, &literal_prefix(pat)))
        .collect();

    roots.sort();
    roots.dedup();

    let mut result: Vec<PathBuf> = Vec::new();
    for candidate in roots {
        if !result.iter().any(|kept| candidate.starts_with(kept)) {
            result.push(candidate);
        }
    }
    result
}

fn nearest_existing_dir(fs: &dyn FileSystem, root: &Path, rel: &Path) -> PathBuf {
    let mut current = root.to_path_buf();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            let next = current.join(part);
            if !fs.is_dir(&next) {
                break;
            }
            current = next;
        }
    }
    current
}

/// Collect all files under `dir` that the filter accepts, relative to `root`.
///
/// Used to seed the content hash store when `skip_unchanged` is enabled.
pub fn collect_matching_files(
    fs: &dyn FileSystem,
    root: &Path,
    dir: &Path,
    filter: &WatchFilter,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                let skip = path
                    .strip_prefix(root)
                    .map(|rel| filter.is_ignored(&rel.to_string_lossy().replace('\\', "/")))
                    .unwrap_or(false);
                if !skip {
                    stack.push(path);
                }
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if filter.matches(&rel_str) {
                        files.push(path);
                    }
                }
            }
        }
    }

    files.sort();
    Ok(files)
}
