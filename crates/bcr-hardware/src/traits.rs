//! Scanner device trait definition.
//!
//! This module defines the contract between the bridge and the vendor scanner
//! driver. The driver is treated as an opaque capability: it can be opened and
//! closed, and its output mode can be set and read back. Captured barcodes do
//! not flow through this trait; the scanner broadcasts them as notifications
//! (see [`notification`](crate::notification)).
//!
//! All methods use native `async fn` (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{DeviceInfo, OutputMode};

/// Barcode scanner device abstraction.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the enum wrapper
/// [`AnyScannerDevice`](crate::devices::AnyScannerDevice) where a concrete
/// type is required.
///
/// # Examples
///
/// ```no_run
/// use bcr_hardware::traits::ScannerDevice;
/// use bcr_hardware::types::OutputMode;
/// use bcr_hardware::error::Result;
///
/// async fn enable_broadcast<S: ScannerDevice>(scanner: &mut S) -> Result<bool> {
///     if !scanner.is_open().await? {
///         scanner.open().await?;
///     }
///     scanner.set_output_mode(OutputMode::Broadcast).await?;
///     Ok(scanner.output_mode().await? == OutputMode::Broadcast)
/// }
/// ```
pub trait ScannerDevice: Send + Sync {
    /// Power up the scan engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be opened, e.g. because another
    /// process holds it.
    async fn open(&mut self) -> Result<()>;

    /// Power down the scan engine.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs.
    async fn close(&mut self) -> Result<()>;

    /// Whether the scan engine is currently open.
    async fn is_open(&self) -> Result<bool>;

    /// Request a new output mode.
    ///
    /// A driver may accept the request and still keep its previous mode;
    /// callers must read the mode back with [`output_mode`](Self::output_mode).
    async fn set_output_mode(&mut self, mode: OutputMode) -> Result<()>;

    /// The output mode the driver currently reports.
    async fn output_mode(&self) -> Result<OutputMode>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}
