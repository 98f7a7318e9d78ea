// tests/integration/error_handling.rs

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use simloop::config::load_and_validate;
use simloop::errors::SimloopError;

fn load(contents: &str) -> Result<simloop::config::ConfigFile, SimloopError> {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    load_and_validate(file.path())
}

fn expect_config_error(contents: &str, needle: &str) {
    match load(contents) {
        Err(SimloopError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} should mention {needle:?}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

const PROJECT: &str = r#"
[project]
project = "App.xcodeproj"
scheme = "App"
"#;

#[test]
fn test_missing_config_file_is_config_error() {
    let result = load_and_validate(Path::new("/definitely/not/here/Simloop.toml"));
    match result {
        Err(SimloopError::ConfigError(msg)) => assert!(msg.contains("Simloop.toml")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_empty_watch_paths_is_config_error() {
    expect_config_error(PROJECT, "watch paths");
}

#[test]
fn test_invalid_watch_glob_is_config_error() {
    expect_config_error(
        &format!("{PROJECT}\n[watch]\npaths = [\"src/[abc\"]\n"),
        "invalid watch path",
    );
}

#[test]
fn test_invalid_ignore_glob_is_config_error() {
    expect_config_error(
        &format!("{PROJECT}\n[watch]\npaths = [\"src/**\"]\nignore = [\"{{a,b\"]\n"),
        "invalid ignore glob",
    );
}

#[test]
fn test_malformed_duration_is_config_error() {
    expect_config_error(
        &format!("{PROJECT}\n[watch]\npaths = [\"src/**\"]\ndebounce = \"soon\"\n"),
        "[watch].debounce",
    );
    expect_config_error(
        &format!("{PROJECT}\n[watch]\npaths = [\"src/**\"]\ngrace_period = \"2 weeks\"\n"),
        "[watch].grace_period",
    );
}

#[test]
fn test_zero_debounce_is_config_error() {
    expect_config_error(
        &format!("{PROJECT}\n[watch]\npaths = [\"src/**\"]\ndebounce = \"0ms\"\n"),
        "greater than zero",
    );
}

#[test]
fn test_missing_project_or_scheme_is_config_error() {
    expect_config_error("[watch]\npaths = [\"src/**\"]\n", "[project].project");
    expect_config_error(
        "[project]\nproject = \"App.xcodeproj\"\n[watch]\npaths = [\"src/**\"]\n",
        "[project].scheme",
    );
}

#[test]
fn test_empty_command_is_config_error() {
    expect_config_error(
        &format!("{PROJECT}\n[build]\ncommand = []\n[watch]\npaths = [\"src/**\"]\n"),
        "[build].command",
    );
    expect_config_error(
        &format!("{PROJECT}\n[watch]\npaths = [\"src/**\"]\ncommand = [\"\"]\n"),
        "[watch].command",
    );
}

#[test]
fn test_toml_syntax_error_is_structured() {
    let result = load("[project\nproject = ");
    assert!(matches!(result, Err(SimloopError::TomlError(_))));
}

#[test]
fn test_exit_codes() {
    assert_eq!(SimloopError::TaskExecution { code: 65 }.exit_code(), 65);
    assert_eq!(SimloopError::TaskExecution { code: -1 }.exit_code(), 1);
    assert_eq!(SimloopError::ConfigError("x".into()).exit_code(), 1);
    assert_eq!(
        SimloopError::tool_unavailable("xcodebuild", "install Xcode").exit_code(),
        1
    );
}

#[test]
fn test_tool_unavailable_message_includes_hint() {
    let err = SimloopError::tool_unavailable("xcrun", "Run `xcode-select --install`.");
    let msg = err.to_string();
    assert!(msg.contains("xcrun"));
    assert!(msg.contains("xcode-select"));
}
