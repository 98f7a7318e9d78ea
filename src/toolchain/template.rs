// src/toolchain/template.rs

//! `{placeholder}` expansion for toolchain argv templates.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::ProjectSection;
use crate::errors::{Result, SimloopError};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex is valid"));

/// Placeholder names an argv template may use.
pub const PLACEHOLDER_NAMES: &[&str] = &["project", "scheme", "configuration", "destination", "device"];

/// Values substituted into argv templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    pub project: String,
    pub scheme: String,
    pub configuration: String,
    pub destination: String,
    pub device: Option<String>,
}

impl TemplateVars {
    pub fn from_project(project: &ProjectSection) -> Self {
        Self {
            project: project.project.clone(),
            scheme: project.scheme.clone(),
            configuration: project.configuration.clone(),
            destination: project.effective_destination(),
            device: project.device.clone(),
        }
    }

    /// Same variables, with `{device}` set to `device`.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    fn lookup(&self, name: &str) -> Result<&str> {
        match name {
            "project" => Ok(&self.project),
            "scheme" => Ok(&self.scheme),
            "configuration" => Ok(&self.configuration),
            "destination" => Ok(&self.destination),
            "device" => self.device.as_deref().ok_or_else(|| {
                SimloopError::ConfigError(
                    "template uses {device} but [project].device is not set".to_string(),
                )
            }),
            other => Err(SimloopError::ConfigError(format!(
                "unknown template placeholder {{{other}}}"
            ))),
        }
    }
}

/// Expand every `{name}` in every argument of `template`.
///
/// Arguments are expanded independently, so a value containing spaces stays
/// a single argument.
pub fn expand(template: &[String], vars: &TemplateVars) -> Result<Vec<String>> {
    template.iter().map(|arg| expand_arg(arg, vars)).collect()
}

fn expand_arg(arg: &str, vars: &TemplateVars) -> Result<String> {
    let mut failure = None;
    let expanded = PLACEHOLDER.replace_all(arg, |caps: &Captures<'_>| {
        match vars.lookup(&caps[1]) {
            Ok(value) => value.to_string(),
            Err(err) => {
                failure.get_or_insert(err);
                String::new()
            }
        }
    });

    match failure {
        Some(err) => Err(err),
        None => Ok(expanded.into_owned()),
    }
}

/// Placeholder names used by `template`, in order of appearance.
///
/// The config loader uses this to reject unknown names before anything runs.
pub fn placeholders(template: &[String]) -> Vec<String> {
    template
        .iter()
        .flat_map(|arg| PLACEHOLDER.captures_iter(arg))
        .map(|caps| caps[1].to_string())
        .collect()
}
