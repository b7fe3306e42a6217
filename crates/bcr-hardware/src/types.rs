//! Common types shared across scanner implementations.
//!
//! This module defines device metadata and the scanner output mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic device information.
///
/// Contains metadata about a scanner such as name, model,
/// serial number, and firmware version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "iPDA018", "Mock Scanner").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional device serial number.
    pub serial_number: Option<String>,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            serial_number: None,
            firmware_version: None,
        }
    }

    /// Set the serial number.
    pub fn with_serial_number(mut self, serial_number: impl Into<String>) -> Self {
        self.serial_number = Some(serial_number.into());
        self
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Where the scanner routes captured barcodes.
///
/// Vendor modes the bridge does not know are kept in [`OutputMode::Other`]
/// so a mismatch can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Scans are broadcast as notifications.
    #[default]
    Broadcast,

    /// Scans are typed into the focused input as key events.
    Keyboard,

    /// Any other vendor-specific mode.
    Other(u8),
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => write!(f, "broadcast"),
            Self::Keyboard => write!(f, "keyboard"),
            Self::Other(code) => write!(f, "mode {}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new("iPDA018", "Built-in 2D imager")
            .with_serial_number("123456789")
            .with_firmware_version("v2.0.1");

        assert_eq!(info.name, "iPDA018");
        assert_eq!(info.model, "Built-in 2D imager");
        assert_eq!(info.serial_number, Some("123456789".to_string()));
        assert_eq!(info.firmware_version, Some("v2.0.1".to_string()));
    }

    #[test]
    fn test_device_info_minimal() {
        let info = DeviceInfo::new("Mock Scanner", "Mock");

        assert_eq!(info.serial_number, None);
        assert_eq!(info.firmware_version, None);
    }

    #[test]
    fn test_output_mode_display() {
        assert_eq!(OutputMode::Broadcast.to_string(), "broadcast");
        assert_eq!(OutputMode::Keyboard.to_string(), "keyboard");
        assert_eq!(OutputMode::Other(7).to_string(), "mode 7");
    }

    #[test]
    fn test_output_mode_serialization() {
        let json = serde_json::to_string(&OutputMode::Broadcast).unwrap();
        assert_eq!(json, "\"broadcast\"");
        let mode: OutputMode = serde_json::from_str(&json).unwrap();
        assert_eq!(mode, OutputMode::Broadcast);
    }
}
