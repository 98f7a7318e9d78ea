// src/watch/path_utils.rs

//! Path normalisation for matching notify events against globs.

use std::path::Path;

/// Render a relative path with forward slashes, the form globs are written in.
pub fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Convert `path` into a forward-slash string relative to `root`.
///
/// Tries a plain `strip_prefix` first; if that fails (symlinked temp dirs,
/// `/private/var` vs `/var` on macOS) both sides are canonicalised and the
/// prefix is stripped again. A path that was just removed cannot be
/// canonicalised, so its parent is canonicalised instead.
///
/// Returns `None` if the path does not live under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let parent = path.parent()?.canonicalize().ok()?;
            parent.join(path.file_name()?)
        }
    };

    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}
