//! Target device resolution.
//!
//! An explicit UDID is used verbatim. Otherwise the attached devices are
//! listed and, unless exactly one is attached, the operator picks one
//! through a [`DeviceChooser`].

pub mod chooser;

use async_trait::async_trait;
use idevctl_shared::device::DeviceRef;
use std::io::IsTerminal;
use tracing::{debug, info};

use crate::clients::DeviceEnumerator;
use crate::clients::tools::ToolDeviceEnumerator;
use crate::config::Config;
use crate::error::DeviceError;
use crate::tui::devices::{Palette, render_devices_table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Take the only attached device without asking.
    AutoSelectSingle,
    /// Always ask, even when a single device is attached.
    AlwaysPrompt,
}

impl SelectionPolicy {
    pub fn from_config(auto_select_single: bool) -> Self {
        if auto_select_single {
            SelectionPolicy::AutoSelectSingle
        } else {
            SelectionPolicy::AlwaysPrompt
        }
    }
}

/// Lets the operator pick one device out of several.
#[async_trait]
pub trait DeviceChooser: Send {
    /// Index into `devices`, or `None` when the operator backs out.
    async fn choose(&mut self, devices: &[DeviceRef]) -> Option<usize>;
}

/// Decide which of the enumerated devices to use.
pub async fn select_device(
    devices: Vec<DeviceRef>,
    policy: SelectionPolicy,
    chooser: &mut dyn DeviceChooser,
) -> Result<DeviceRef, DeviceError> {
    if devices.is_empty() {
        return Err(DeviceError::NoDevice);
    }

    if devices.len() == 1 && policy == SelectionPolicy::AutoSelectSingle {
        return devices.into_iter().next().ok_or(DeviceError::NoDevice);
    }

    let index = chooser
        .choose(&devices)
        .await
        .ok_or(DeviceError::SelectionCancelled)?;
    devices
        .into_iter()
        .nth(index)
        .ok_or(DeviceError::SelectionCancelled)
}

/// Resolve the device a command should talk to.
pub async fn resolve(
    explicit: Option<&str>,
    enumerator: &dyn DeviceEnumerator,
    chooser: &mut dyn DeviceChooser,
    policy: SelectionPolicy,
) -> Result<DeviceRef, DeviceError> {
    if let Some(udid) = explicit.filter(|udid| !udid.is_empty()) {
        return Ok(DeviceRef::new(udid));
    }

    let devices = enumerator
        .list_devices()
        .await
        .map_err(DeviceError::Enumerate)?;
    debug!("found {} attached device(s)", devices.len());

    let device = select_device(devices, policy, chooser).await?;
    info!("Using device {}", device);
    Ok(device)
}

/// Entry point for `idevctl devices`.
pub async fn list(config: &Config) -> anyhow::Result<()> {
    let enumerator = ToolDeviceEnumerator::new(config.tools.clone());
    let devices = enumerator
        .list_devices()
        .await
        .map_err(DeviceError::Enumerate)?;

    let stdout = std::io::stdout();
    let palette = Palette::new(stdout.is_terminal());
    print!("{}", render_devices_table(&devices, palette));
    Ok(())
}
