//! Enum wrapper for scanner device dispatch.
//!
//! Native `async fn` in traits (RPITIT - Rust Edition 2024) are not
//! object-safe, so `Box<dyn ScannerDevice>` is not available. The bridge owns
//! an [`AnyScannerDevice`] instead, which dispatches to the concrete driver
//! at compile time.
//!
//! # Examples
//!
//! ```
//! use bcr_hardware::devices::AnyScannerDevice;
//! use bcr_hardware::mock::MockScanner;
//! use bcr_hardware::notification::NotificationBus;
//!
//! let (scanner, _handle) = MockScanner::new(NotificationBus::new());
//! let any_scanner = AnyScannerDevice::Mock(scanner);
//! ```

use crate::mock::MockScanner;
use crate::traits::ScannerDevice;
use crate::{DeviceInfo, OutputMode, Result};

/// Enum wrapper for scanner device dispatch.
///
/// # Examples
///
/// ```
/// use bcr_hardware::devices::AnyScannerDevice;
/// use bcr_hardware::traits::ScannerDevice;
/// use bcr_hardware::mock::MockScanner;
/// use bcr_hardware::notification::NotificationBus;
///
/// #[tokio::main]
/// async fn main() -> bcr_hardware::Result<()> {
///     let (scanner, _handle) = MockScanner::new(NotificationBus::new());
///     let any_scanner = AnyScannerDevice::Mock(scanner);
///
///     let info = any_scanner.get_info().await?;
///     println!("Scanner: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyScannerDevice {
    /// Mock scanner for development and testing.
    Mock(MockScanner),
}

impl ScannerDevice for AnyScannerDevice {
    async fn open(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.open().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Self::Mock(device) => device.close().await,
        }
    }

    async fn is_open(&self) -> Result<bool> {
        match self {
            Self::Mock(device) => device.is_open().await,
        }
    }

    async fn set_output_mode(&mut self, mode: OutputMode) -> Result<()> {
        match self {
            Self::Mock(device) => device.set_output_mode(mode).await,
        }
    }

    async fn output_mode(&self) -> Result<OutputMode> {
        match self {
            Self::Mock(device) => device.output_mode().await,
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

impl From<MockScanner> for AnyScannerDevice {
    fn from(device: MockScanner) -> Self {
        Self::Mock(device)
    }
}
