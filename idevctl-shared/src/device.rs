use serde::{Deserialize, Serialize};
use std::fmt;

/// A device reachable over the USB multiplexer, identified by its UDID.
///
/// The label is only used to help the operator pick a device and is never
/// sent to the device.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DeviceRef {
    pub udid: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl DeviceRef {
    pub fn new(udid: impl Into<String>) -> Self {
        Self {
            udid: udid.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label = if label.trim().is_empty() {
            None
        } else {
            Some(label)
        };
        self
    }
}

impl fmt::Display for DeviceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({})", self.udid, label),
            None => f.write_str(&self.udid),
        }
    }
}

/// Parse the output of a device listing tool such as `idevice_id -l`.
///
/// Each non-empty line starts with a UDID, optionally followed by the
/// connection type in parentheses (`00008030-001A (USB)`). A device that is
/// attached over both USB and network shows up twice; only the first entry
/// is kept so the listing order is preserved.
pub fn parse_device_list(output: &str) -> Vec<DeviceRef> {
    let mut devices: Vec<DeviceRef> = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (udid, rest) = match line.split_once(char::is_whitespace) {
            Some((udid, rest)) => (udid, rest.trim()),
            None => (line, ""),
        };

        if devices.iter().any(|d| d.udid == udid) {
            continue;
        }

        let connection = rest.trim_start_matches('(').trim_end_matches(')').trim();
        devices.push(DeviceRef::new(udid).with_label(connection));
    }

    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_udids() {
        let out = "00008030-001A2D3E0C41802E\nabcdef0123456789abcdef0123456789abcdef01\n";
        let devices = parse_device_list(out);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].udid, "00008030-001A2D3E0C41802E");
        assert_eq!(devices[0].label, None);
        assert_eq!(devices[1].udid, "abcdef0123456789abcdef0123456789abcdef01");
    }

    #[test]
    fn test_parse_connection_suffix() {
        let devices = parse_device_list("00008030-001A (USB)\n00008101-0002 (Network)\n");
        assert_eq!(devices[0].label.as_deref(), Some("USB"));
        assert_eq!(devices[1].label.as_deref(), Some("Network"));
    }

    #[test]
    fn test_parse_dedupes_keeping_first() {
        let devices = parse_device_list("AAAA (USB)\nBBBB (USB)\nAAAA (Network)\n");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0], DeviceRef::new("AAAA").with_label("USB"));
        assert_eq!(devices[1].udid, "BBBB");
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_device_list("").is_empty());
        assert!(parse_device_list("\n  \n").is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceRef::new("AAAA").to_string(), "AAAA");
        assert_eq!(
            DeviceRef::new("AAAA").with_label("iPhone").to_string(),
            "AAAA (iPhone)"
        );
    }

    #[test]
    fn test_blank_label_is_dropped() {
        assert_eq!(DeviceRef::new("AAAA").with_label("  ").label, None);
    }
}
