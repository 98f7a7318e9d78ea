// tests/integration/commands_workflow.rs
//
// Subcommand workflows against stand-in tools (`sh` scripts), so the
// sequencing can be checked without a real toolchain.

#![cfg(unix)]

use std::path::Path;

use tempfile::TempDir;
use simloop::commands::{self, Workspace};
use simloop::errors::SimloopError;
use simloop::toolchain::{self, BootOutcome};
use simloop_test_utils::builders::ConfigFileBuilder;

const DEVICES: &str = "\
== Devices ==
-- iOS 17.2 --
    iPhone 15 (8B6F3B8C-1E2A-4C1B-9E0D-2F6A7C1D9E01) (Shutdown)
    iPhone 15 Pro (A1B2C3D4-E5F6-4711-8899-AABBCCDDEEFF) (Booted)
";

/// Temp project with an `App.xcodeproj` and a canned device list.
fn project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("App.xcodeproj")).unwrap();
    std::fs::write(dir.path().join("devices.txt"), DEVICES).unwrap();
    dir
}

/// Config whose tools append a line to `log.txt` for every step.
fn scripted() -> ConfigFileBuilder {
    ConfigFileBuilder::new()
        .build_command(&["sh", "-c", "echo \"build $0 $1\" >> log.txt", "{scheme}", "{configuration}"])
        .clean_command(&["sh", "-c", "echo clean >> log.txt"])
        .list_command(&["cat", "devices.txt"])
        .boot_command(&["sh", "-c", "echo \"boot $0\" >> log.txt", "{device}"])
        .open_command(&["sh", "-c", "echo open >> log.txt"])
}

fn log(root: &Path) -> Vec<String> {
    std::fs::read_to_string(root.join("log.txt"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_build_runs_expanded_build_command() {
    let dir = project();
    let ws = Workspace::new(scripted().build(), dir.path());

    commands::build(&ws).await.unwrap();
    assert_eq!(log(dir.path()), vec!["build App Debug"]);
}

#[tokio::test]
async fn test_build_failure_propagates_exit_code() {
    let dir = project();
    let cfg = scripted().build_command(&["sh", "-c", "exit 4"]).build();
    let ws = Workspace::new(cfg, dir.path());

    let err = commands::build(&ws).await.unwrap_err();
    assert!(matches!(err, SimloopError::TaskExecution { code: 4 }));
    assert_eq!(err.exit_code(), 4);
}

#[tokio::test]
async fn test_build_requires_project_artifact() {
    let dir = project();
    let cfg = scripted().project("Missing.xcodeproj").build();
    let ws = Workspace::new(cfg, dir.path());

    match commands::build(&ws).await {
        Err(SimloopError::MissingArtifact(path)) => {
            assert!(path.ends_with("Missing.xcodeproj"));
        }
        other => panic!("Expected MissingArtifact, got: {:?}", other),
    }
    assert!(log(dir.path()).is_empty(), "nothing runs without the project");
}

#[tokio::test]
async fn test_missing_tool_is_reported_before_running() {
    let dir = project();
    let cfg = scripted()
        .build_command(&["simloop-missing-build-tool", "{scheme}"])
        .build();
    let ws = Workspace::new(cfg, dir.path());

    match commands::build(&ws).await {
        Err(SimloopError::ToolUnavailable { tool, hint }) => {
            assert_eq!(tool, "simloop-missing-build-tool");
            assert!(hint.contains("PATH"));
        }
        other => panic!("Expected ToolUnavailable, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_run_builds_boots_and_opens_in_order() {
    let dir = project();
    let ws = Workspace::new(scripted().device("iPhone 15").build(), dir.path());

    commands::run(&ws).await.unwrap();
    assert_eq!(
        log(dir.path()),
        vec!["build App Debug", "boot iPhone 15", "open"]
    );
}

#[tokio::test]
async fn test_run_skips_boot_for_booted_device() {
    let dir = project();
    let ws = Workspace::new(scripted().device("iPhone 15 Pro").build(), dir.path());

    commands::run(&ws).await.unwrap();
    assert_eq!(log(dir.path()), vec!["build App Debug", "open"]);
}

#[tokio::test]
async fn test_run_with_unknown_device_fails() {
    let dir = project();
    let ws = Workspace::new(scripted().device("Pixel 8").build(), dir.path());

    match commands::run(&ws).await {
        Err(SimloopError::DeviceNotFound(name)) => assert_eq!(name, "Pixel 8"),
        other => panic!("Expected DeviceNotFound, got: {:?}", other),
    }
    // The build already happened; nothing after boot ran.
    assert_eq!(log(dir.path()), vec!["build App Debug"]);
}

#[tokio::test]
async fn test_run_requires_device() {
    let dir = project();
    let ws = Workspace::new(scripted().build(), dir.path());

    assert!(matches!(
        commands::run(&ws).await,
        Err(SimloopError::ConfigError(_))
    ));
}

#[tokio::test]
async fn test_boot_reports_outcome() {
    let dir = project();
    let cfg = scripted().device("iPhone 15").build();

    let outcome = toolchain::boot(&cfg, dir.path(), "iPhone 15 Pro").await.unwrap();
    assert_eq!(outcome, BootOutcome::AlreadyBooted);

    match toolchain::boot(&cfg, dir.path(), "iPhone 15").await.unwrap() {
        BootOutcome::Invoked(status) => assert!(status.success()),
        other => panic!("Expected Invoked, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_list_devices_failure_is_task_error() {
    let dir = project();
    let cfg = scripted().list_command(&["sh", "-c", "exit 2"]).build();

    let err = toolchain::list_devices(&cfg, dir.path()).await.unwrap_err();
    assert!(matches!(err, SimloopError::TaskExecution { code: 2 }));
}

#[test]
fn test_serve_skips_initial_run_only_for_the_build_command() {
    let dir = project();
    let ws = Workspace::new(scripted().build(), dir.path());
    let wc = commands::serve_watch_config(&ws).unwrap();
    assert!(!wc.initial_run(), "run has just built; no second build");
    assert_eq!(wc.task_command()[0], "sh");

    let ws = Workspace::new(scripted().watch_command(&["make", "test"]).build(), dir.path());
    assert!(commands::serve_watch_config(&ws).unwrap().initial_run());

    // Plain `watch` always runs once up front.
    let ws = Workspace::new(scripted().build(), dir.path());
    assert!(ws.config.watch_config(&ws.root).unwrap().initial_run());
}

#[tokio::test]
async fn test_clean_runs_clean_command() {
    let dir = project();
    let ws = Workspace::new(scripted().build(), dir.path());

    commands::clean(&ws).await.unwrap();
    assert_eq!(log(dir.path()), vec!["clean"]);
}

#[test]
fn test_check_passes_with_tools_and_project() {
    let dir = project();
    let ws = Workspace::new(scripted().device("iPhone 15").build(), dir.path());
    commands::check(&ws).unwrap();
}

#[test]
fn test_check_fails_on_missing_project() {
    let dir = project();
    let ws = Workspace::new(scripted().project("Other.xcodeproj").build(), dir.path());
    assert!(matches!(
        commands::check(&ws),
        Err(SimloopError::MissingArtifact(_))
    ));
}

#[test]
fn test_check_reports_first_missing_tool() {
    let dir = project();
    let cfg = scripted()
        .open_command(&["simloop-missing-launcher"])
        .build();
    let ws = Workspace::new(cfg, dir.path());
    match commands::check(&ws) {
        Err(SimloopError::ToolUnavailable { tool, .. }) => {
            assert_eq!(tool, "simloop-missing-launcher");
        }
        other => panic!("Expected ToolUnavailable, got: {:?}", other),
    }
}
