// src/watch/hash.rs

//! Content hashing for `skip_unchanged = true`.
//!
//! Editors and build tools frequently touch files without changing them
//! (save-without-edit, `touch`, metadata updates). When enabled, the watcher
//! remembers a `blake3` hash per watched file and drops events whose file
//! content is identical to the last hash seen.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Per-file content hashes, kept in memory for the life of the watcher.
#[derive(Debug)]
pub struct ContentFilter {
    fs: Arc<dyn FileSystem>,
    hashes: HashMap<PathBuf, String>,
}

impl ContentFilter {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            hashes: HashMap::new(),
        }
    }

    /// Record the current hash of every file in `files`.
    pub fn seed<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for path in files {
            match compute_file_hash(self.fs.as_ref(), &path) {
                Ok(hash) => {
                    self.hashes.insert(path, hash);
                }
                Err(err) => debug!(?path, error = %err, "could not seed file hash"),
            }
        }
        debug!(files = self.hashes.len(), "seeded content hashes");
    }

    /// Returns true if `path` should count as changed.
    ///
    /// Missing files (removed or renamed away) always count as changes, as do
    /// files whose hash cannot be computed. Directory events are dropped.
    pub fn has_changed(&mut self, path: &Path) -> bool {
        if !self.fs.is_file(path) {
            return self.hashes.remove(path).is_some() || !self.fs.exists(path);
        }

        let new_hash = match compute_file_hash(self.fs.as_ref(), path) {
            Ok(h) => h,
            Err(err) => {
                warn!(?path, error = %err, "failed to hash changed file; treating as changed");
                return true;
            }
        };

        match self.hashes.insert(path.to_path_buf(), new_hash.clone()) {
            Some(old) if old == new_hash => {
                debug!(?path, "content unchanged; dropping event");
                false
            }
            _ => true,
        }
    }
}
