// src/toolchain/simulator.rs

//! Simulator control (`[simulator]` section): list devices, boot one, open
//! the simulator app.

use std::path::Path;
use std::process::ExitStatus;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::errors::{Result, SimloopError};

use super::template::expand;
use super::{capture_tool, run_tool};

static DEVICE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(?P<name>.+?) \((?P<udid>[0-9A-Fa-f-]{36})\) \((?P<state>[^)]+)\)")
        .expect("device line regex is valid")
});

static RUNTIME_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-- (?P<runtime>.+) --$").expect("runtime header regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Shutdown,
    Booted,
    Booting,
    Unknown,
}

impl From<&str> for DeviceState {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "shutdown" => DeviceState::Shutdown,
            "booted" => DeviceState::Booted,
            "booting" => DeviceState::Booting,
            _ => DeviceState::Unknown,
        }
    }
}

/// One line of the device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub udid: String,
    pub state: DeviceState,
    /// Runtime header the device was listed under, e.g. "iOS 17.2".
    pub runtime: Option<String>,
}

/// What `boot` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    AlreadyBooted,
    Invoked(ExitStatus),
}

/// Raw text of `[simulator].list_command`.
pub async fn list_devices(cfg: &ConfigFile, root: &Path) -> Result<String> {
    let argv = expand(&cfg.simulator.list_command, &cfg.template_vars())?;
    capture_tool(&argv, root).await
}

/// Parse the device list printed by `xcrun simctl list devices`.
///
/// Lines that don't describe a device are skipped.
pub fn parse_devices(text: &str) -> Vec<Device> {
    let mut runtime = None;
    let mut devices = Vec::new();

    for line in text.lines() {
        if let Some(caps) = RUNTIME_HEADER.captures(line.trim()) {
            runtime = Some(caps["runtime"].to_string());
            continue;
        }
        if let Some(caps) = DEVICE_LINE.captures(line) {
            devices.push(Device {
                name: caps["name"].to_string(),
                udid: caps["udid"].to_string(),
                state: DeviceState::from(&caps["state"]),
                runtime: runtime.clone(),
            });
        }
    }

    devices
}

/// Devices whose name (or UDID) is `device`.
pub fn find_devices<'a>(devices: &'a [Device], device: &str) -> Vec<&'a Device> {
    devices
        .iter()
        .filter(|d| d.name == device || d.udid.eq_ignore_ascii_case(device))
        .collect()
}

/// Boot `device` unless it is already booted.
///
/// Fails with `DeviceNotFound` if the device is not in the list.
pub async fn boot(cfg: &ConfigFile, root: &Path, device: &str) -> Result<BootOutcome> {
    let listing = list_devices(cfg, root).await?;
    let devices = parse_devices(&listing);
    debug!(count = devices.len(), "parsed simulator device list");

    let matches = find_devices(&devices, device);
    if matches.is_empty() {
        return Err(SimloopError::DeviceNotFound(device.to_string()));
    }
    if matches.iter().any(|d| d.state == DeviceState::Booted) {
        info!(device, "simulator already booted");
        return Ok(BootOutcome::AlreadyBooted);
    }

    let vars = cfg.template_vars().with_device(device);
    let argv = expand(&cfg.simulator.boot_command, &vars)?;
    info!(device, "booting simulator");
    let status = run_tool(&argv, root).await?;
    Ok(BootOutcome::Invoked(status))
}

/// Bring the simulator app to the foreground.
pub async fn open_simulator(cfg: &ConfigFile, root: &Path) -> Result<ExitStatus> {
    let argv = expand(&cfg.simulator.open_command, &cfg.template_vars())?;
    info!("opening simulator app");
    run_tool(&argv, root).await
}
