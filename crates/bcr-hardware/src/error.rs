//! Error types for scanner hardware operations.

use crate::types::OutputMode;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors reported by a scanner driver.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The scan engine is not open, or went away.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// The scan engine refused to open.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// The driver accepted a mode change but kept reporting another mode.
    #[error("Output mode {requested} requested, scanner reports {reported}")]
    ModeRejected {
        requested: OutputMode,
        reported: OutputMode,
    },
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    pub fn mode_rejected(requested: OutputMode, reported: OutputMode) -> Self {
        Self::ModeRejected {
            requested,
            reported,
        }
    }
}

/// Open and mode failures are initialization errors; a scanner that went
/// away is a hardware error.
impl From<HardwareError> for bcr_core::Error {
    fn from(e: HardwareError) -> Self {
        match e {
            HardwareError::Disconnected { .. } => bcr_core::Error::Hardware(e.to_string()),
            HardwareError::InitializationFailed { message } => bcr_core::Error::Init(message),
            HardwareError::ModeRejected { .. } => bcr_core::Error::Init(e.to_string()),
        }
    }
}
