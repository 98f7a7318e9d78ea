// src/toolchain/availability.rs

//! Check that external tools exist on `PATH` before invoking them.

use std::path::{Path, PathBuf};

use tracing::debug;
use which::which;

use crate::errors::{Result, SimloopError};

/// Fail with `ToolUnavailable` unless `program` can be found.
///
/// Programs given with a path component (`./scripts/build.sh`) are checked
/// relative to `cwd` instead of `PATH`.
pub fn require_tool(program: &str, cwd: &Path, hint: &str) -> Result<PathBuf> {
    let found = if Path::new(program).components().count() > 1 {
        let candidate = cwd.join(program);
        candidate.is_file().then_some(candidate)
    } else {
        which(program).ok()
    };

    match found {
        Some(path) => {
            debug!(program, resolved = ?path, "tool available");
            Ok(path)
        }
        None => Err(SimloopError::tool_unavailable(program, hint)),
    }
}

/// `require_tool` for the program of an argv template.
pub fn require_command(argv: &[String], cwd: &Path) -> Result<PathBuf> {
    let program = argv
        .first()
        .ok_or_else(|| SimloopError::ConfigError("command is empty".to_string()))?;
    require_tool(program, cwd, &install_hint(program))
}

/// Installation hint shown when `program` is missing.
pub fn install_hint(program: &str) -> String {
    match program {
        "xcodebuild" => {
            "Install Xcode from the App Store, then run `xcode-select --install`.".to_string()
        }
        "xcrun" => "Install the Xcode command line tools: `xcode-select --install`.".to_string(),
        "open" => "The `open` launcher ships with macOS.".to_string(),
        other => format!("Install `{other}` and make sure it is on your PATH."),
    }
}
