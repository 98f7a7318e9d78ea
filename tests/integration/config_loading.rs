// tests/integration/config_loading.rs

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;
use simloop::config::{load_and_validate, project_root};
use simloop::errors::SimloopError;
use simloop::toolchain::TemplateVars;
use simloop_test_utils::builders::ConfigFileBuilder;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_full_config_round_trips_into_typed_model() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[project]
project = "Demo.xcodeproj"
scheme = "Demo"
configuration = "Release"
device = "iPhone 15"

[build]
command = ["./scripts/build.sh", "{{scheme}}", "{{configuration}}"]

[simulator]
open_command = ["open", "-a", "Simulator", "--args", "-CurrentDeviceUDID"]

[watch]
paths = ["Demo/**/*.swift", "Demo/Resources/**"]
ignore = ["**/*.generated.swift"]
debounce = "250ms"
grace_period = "5s"
skip_unchanged = true
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.project.configuration, "Release");
    assert_eq!(
        cfg.project.effective_destination(),
        "platform=iOS Simulator,name=iPhone 15"
    );
    assert_eq!(cfg.build.command[0], "./scripts/build.sh");
    // Sections that are not mentioned keep their defaults.
    assert_eq!(cfg.build.clean_command[0], "xcodebuild");
    assert_eq!(cfg.simulator.boot_command, strings(&["xcrun", "simctl", "boot", "{device}"]));
    assert_eq!(cfg.watch.debounce, Duration::from_millis(250));
    assert_eq!(cfg.watch.grace_period, Duration::from_secs(5));
    assert!(cfg.watch.skip_unchanged);
}

#[test]
fn test_defaults_target_xcodebuild_and_simctl() {
    let cfg = ConfigFileBuilder::new().build();
    assert_eq!(cfg.project.configuration, "Debug");
    assert_eq!(cfg.build.command.first().map(String::as_str), Some("xcodebuild"));
    assert_eq!(cfg.build.clean_command.last().map(String::as_str), Some("clean"));
    assert_eq!(cfg.simulator.list_command, strings(&["xcrun", "simctl", "list", "devices"]));
    assert_eq!(cfg.simulator.open_command, strings(&["open", "-a", "Simulator"]));
    assert_eq!(cfg.watch.debounce, Duration::from_millis(300));
    assert_eq!(cfg.watch.grace_period, Duration::from_secs(2));
    assert!(!cfg.watch.skip_unchanged);
}

#[test]
fn test_watch_config_uses_expanded_build_command_by_default() {
    let cfg = ConfigFileBuilder::new()
        .project("Demo.xcodeproj")
        .scheme("Demo")
        .device("iPad Air")
        .ignore("build/**")
        .debounce("150ms")
        .build();

    let wc = cfg.watch_config(Path::new("/work/demo")).unwrap();
    assert_eq!(wc.root(), Path::new("/work/demo"));
    assert_eq!(wc.paths(), strings(&["src/**"]).as_slice());
    assert_eq!(wc.ignore(), strings(&["build/**"]).as_slice());
    assert_eq!(wc.debounce_interval(), Duration::from_millis(150));
    assert_eq!(
        wc.task_command(),
        strings(&[
            "xcodebuild",
            "-project",
            "Demo.xcodeproj",
            "-scheme",
            "Demo",
            "-configuration",
            "Debug",
            "-destination",
            "platform=iOS Simulator,name=iPad Air",
            "build",
        ])
        .as_slice()
    );
}

#[test]
fn test_watch_command_overrides_build_command() {
    let cfg = ConfigFileBuilder::new()
        .watch_command(&["make", "{scheme}"])
        .build();
    let wc = cfg.watch_config(Path::new(".")).unwrap();
    assert_eq!(wc.task_command(), strings(&["make", "App"]).as_slice());
}

#[test]
fn test_unknown_placeholder_is_rejected_at_load() {
    let err = ConfigFileBuilder::new()
        .watch_command(&["make", "{target}"])
        .try_build()
        .unwrap_err();
    match err {
        SimloopError::ConfigError(msg) => {
            assert!(msg.contains("[watch].command"), "got: {msg}");
            assert!(msg.contains("{target}"), "got: {msg}");
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }

    assert!(matches!(
        ConfigFileBuilder::new()
            .boot_command(&["xcrun", "simctl", "boot", "{udid}"])
            .try_build(),
        Err(SimloopError::ConfigError(_))
    ));
}

#[test]
fn test_device_placeholder_loads_without_device() {
    // `{device}` is a known name; a missing device only fails at expansion.
    let cfg = ConfigFileBuilder::new()
        .watch_command(&["make", "{device}"])
        .build();
    assert!(cfg.watch_config(Path::new(".")).is_err());
}

#[test]
fn test_template_vars_follow_project_section() {
    let cfg = ConfigFileBuilder::new().device("iPhone 15").build();
    let vars = cfg.template_vars();
    assert_eq!(
        vars,
        TemplateVars {
            project: "App.xcodeproj".into(),
            scheme: "App".into(),
            configuration: "Debug".into(),
            destination: "platform=iOS Simulator,name=iPhone 15".into(),
            device: Some("iPhone 15".into()),
        }
    );
}

#[test]
fn test_project_root_is_config_directory() {
    assert_eq!(project_root(Path::new("ios/Simloop.toml")), Path::new("ios"));
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(project_root(Path::new("Simloop.toml")), cwd);
}
