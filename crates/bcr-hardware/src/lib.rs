//! Scanner hardware abstraction layer for the barcode reader bridge.
//!
//! This crate models the collaborators the bridge depends on but does not
//! own: the vendor scan engine and the broadcast transport that carries scan
//! payloads from the engine to listeners.
//!
//! # Design Philosophy
//!
//! - **Async-first**: Device operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: [`AnyScannerDevice`] provides a concrete type over all
//!   supported drivers.
//! - **Synchronous delivery**: notifications reach receivers on the sender's
//!   thread; receivers must not block.
//! - **Error-aware**: All device operations return `Result<T>`.
//!
//! # Scanner Devices
//!
//! ```no_run
//! use bcr_hardware::traits::ScannerDevice;
//! use bcr_hardware::types::OutputMode;
//! use bcr_hardware::error::Result;
//!
//! async fn prepare<S: ScannerDevice>(scanner: &mut S) -> Result<()> {
//!     if !scanner.is_open().await? {
//!         scanner.open().await?;
//!     }
//!     scanner.set_output_mode(OutputMode::Broadcast).await
//! }
//! ```
//!
//! # Notifications
//!
//! Scans arrive as [`Notification`]s on a [`NotificationBus`]; see the
//! [`notification`] module.
//!
//! # Mock Implementations
//!
//! [`mock::MockScanner`] simulates a scan engine and, through its handle,
//! broadcasts scan notifications for development and testing without
//! physical hardware.
//!
//! [`AnyScannerDevice`]: devices::AnyScannerDevice
//! [`Notification`]: notification::Notification
//! [`NotificationBus`]: notification::NotificationBus

pub mod devices;
pub mod error;
pub mod mock;
pub mod notification;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyScannerDevice;
pub use error::{HardwareError, Result};
pub use notification::{
    ActionFilter, Extra, Notification, NotificationBus, NotificationReceiver, ReceiverId,
};
pub use traits::ScannerDevice;
pub use types::{DeviceInfo, OutputMode};
