//! Mock barcode scanner implementation for testing and development.
//!
//! This module provides a simulated scan engine that can be controlled
//! programmatically for testing without requiring physical hardware. Scans
//! are broadcast on a [`NotificationBus`] exactly as the firmware would.

use crate::{
    HardwareError, Result,
    notification::{Notification, NotificationBus},
    traits::ScannerDevice,
    types::{DeviceInfo, OutputMode},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Engine state shared between the scanner and its handle.
#[derive(Debug, Default)]
struct EngineState {
    open: bool,
    mode: OutputMode,
    /// When set, `set_output_mode` is accepted but the engine keeps this mode.
    pinned_mode: Option<OutputMode>,
    fail_open: bool,
    /// When set, every driver call reports the engine as disconnected.
    unplugged: bool,
    open_count: usize,
    close_count: usize,
}

fn lock(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock barcode scanner for testing and development.
///
/// # Examples
///
/// ```
/// use bcr_hardware::mock::MockScanner;
/// use bcr_hardware::notification::NotificationBus;
/// use bcr_hardware::traits::ScannerDevice;
/// use bcr_hardware::types::OutputMode;
///
/// #[tokio::main]
/// async fn main() -> bcr_hardware::Result<()> {
///     let (mut scanner, handle) = MockScanner::new(NotificationBus::new());
///
///     scanner.open().await?;
///     scanner.set_output_mode(OutputMode::Broadcast).await?;
///     assert!(handle.is_open());
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockScanner {
    /// Engine state shared with the handle
    state: Arc<Mutex<EngineState>>,

    /// Device name
    name: String,
}

impl MockScanner {
    /// Create a new mock scanner broadcasting on `bus`.
    ///
    /// Returns a tuple of (MockScanner, MockScannerHandle) where the handle
    /// can be used to simulate scans and driver misbehavior.
    pub fn new(bus: NotificationBus) -> (Self, MockScannerHandle) {
        Self::with_name("Mock Scanner".to_string(), bus)
    }

    /// Create a new mock scanner with a custom name.
    pub fn with_name(name: String, bus: NotificationBus) -> (Self, MockScannerHandle) {
        let state = Arc::new(Mutex::new(EngineState {
            // Factory default routes scans to the keyboard
            mode: OutputMode::Keyboard,
            ..EngineState::default()
        }));

        let scanner = Self {
            state: Arc::clone(&state),
            name: name.clone(),
        };

        let handle = MockScannerHandle { state, bus, name };

        (scanner, handle)
    }
}

impl ScannerDevice for MockScanner {
    async fn open(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.unplugged {
            return Err(HardwareError::disconnected(self.name.clone()));
        }
        if state.fail_open {
            return Err(HardwareError::initialization_failed(format!(
                "{} scan engine busy",
                self.name
            )));
        }
        state.open = true;
        state.open_count += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.unplugged {
            return Err(HardwareError::disconnected(self.name.clone()));
        }
        state.open = false;
        state.close_count += 1;
        Ok(())
    }

    async fn is_open(&self) -> Result<bool> {
        let state = lock(&self.state);
        if state.unplugged {
            return Err(HardwareError::disconnected(self.name.clone()));
        }
        Ok(state.open)
    }

    async fn set_output_mode(&mut self, mode: OutputMode) -> Result<()> {
        let mut state = lock(&self.state);
        if state.unplugged || !state.open {
            return Err(HardwareError::disconnected(self.name.clone()));
        }
        state.mode = state.pinned_mode.unwrap_or(mode);
        Ok(())
    }

    async fn output_mode(&self) -> Result<OutputMode> {
        Ok(lock(&self.state).mode)
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock")
            .with_serial_number("MOCK-0001")
            .with_firmware_version("mock-1.0"))
    }
}

/// Handle for controlling a mock scanner.
///
/// # Examples
///
/// ```
/// use bcr_hardware::mock::MockScanner;
/// use bcr_hardware::notification::NotificationBus;
///
/// let bus = NotificationBus::new();
/// let (_scanner, handle) = MockScanner::new(bus);
///
/// // Nobody is listening yet
/// assert_eq!(handle.scan("A12345", 1), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockScannerHandle {
    state: Arc<Mutex<EngineState>>,
    bus: NotificationBus,
    name: String,
}

impl MockScannerHandle {
    /// Simulate a well-formed scan of `text` with symbology tag `type_tag`.
    ///
    /// Returns the number of receivers the notification reached.
    pub fn scan(&self, text: &str, type_tag: i8) -> usize {
        let payload = text.as_bytes().to_vec();
        let length = i32::try_from(payload.len()).unwrap_or(i32::MAX);
        self.bus
            .send(&Notification::scan_feedback(payload, length, type_tag))
    }

    /// Simulate a scan with an explicit declared length.
    pub fn scan_raw(&self, payload: Vec<u8>, length: i32, type_tag: i8) -> usize {
        self.bus
            .send(&Notification::scan_feedback(payload, length, type_tag))
    }

    /// Broadcast an arbitrary notification.
    pub fn send(&self, notification: &Notification) -> usize {
        self.bus.send(notification)
    }

    /// Make subsequent `open` calls fail.
    pub fn set_fail_open(&self, fail: bool) {
        lock(&self.state).fail_open = fail;
    }

    /// Simulate the engine going away; driver calls fail until plugged back.
    pub fn set_unplugged(&self, unplugged: bool) {
        lock(&self.state).unplugged = unplugged;
    }

    /// Pin the engine to `mode`, ignoring mode change requests.
    pub fn pin_output_mode(&self, mode: Option<OutputMode>) {
        let mut state = lock(&self.state);
        state.pinned_mode = mode;
        if let Some(mode) = mode {
            state.mode = mode;
        }
    }

    /// Open the engine out-of-band, as another process would.
    pub fn force_open(&self) {
        lock(&self.state).open = true;
    }

    /// Whether the engine is open.
    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    /// Current output mode.
    pub fn output_mode(&self) -> OutputMode {
        lock(&self.state).mode
    }

    /// Number of successful `open` calls.
    pub fn open_count(&self) -> usize {
        lock(&self.state).open_count
    }

    /// Number of `close` calls.
    pub fn close_count(&self) -> usize {
        lock(&self.state).close_count
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{ActionFilter, NotificationReceiver};
    use bcr_core::constants::{EXTRA_BARCODE, EXTRA_LENGTH, SCAN_FEEDBACK_ACTION};

    #[derive(Default)]
    struct Capture(Mutex<Vec<Notification>>);

    impl NotificationReceiver for Capture {
        fn on_receive(&self, notification: &Notification) {
            self.0.lock().unwrap().push(notification.clone());
        }
    }

    #[tokio::test]
    async fn test_mock_scanner_open_close() {
        let (mut scanner, handle) = MockScanner::new(NotificationBus::new());

        assert!(!scanner.is_open().await.unwrap());
        scanner.open().await.unwrap();
        assert!(scanner.is_open().await.unwrap());
        assert!(handle.is_open());

        scanner.close().await.unwrap();
        assert!(!handle.is_open());
        assert_eq!(handle.open_count(), 1);
        assert_eq!(handle.close_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_scanner_fail_open() {
        let (mut scanner, handle) = MockScanner::new(NotificationBus::new());
        handle.set_fail_open(true);

        let err = scanner.open().await.unwrap_err();
        assert!(matches!(err, HardwareError::InitializationFailed { .. }));
        assert!(!handle.is_open());
    }

    #[tokio::test]
    async fn test_mock_scanner_output_mode() {
        let (mut scanner, handle) = MockScanner::new(NotificationBus::new());
        assert_eq!(scanner.output_mode().await.unwrap(), OutputMode::Keyboard);

        // Closed engine rejects configuration
        assert!(scanner.set_output_mode(OutputMode::Broadcast).await.is_err());

        scanner.open().await.unwrap();
        scanner.set_output_mode(OutputMode::Broadcast).await.unwrap();
        assert_eq!(handle.output_mode(), OutputMode::Broadcast);
    }

    #[tokio::test]
    async fn test_mock_scanner_pinned_mode() {
        let (mut scanner, handle) = MockScanner::new(NotificationBus::new());
        handle.pin_output_mode(Some(OutputMode::Other(3)));

        scanner.open().await.unwrap();
        scanner.set_output_mode(OutputMode::Broadcast).await.unwrap();
        assert_eq!(scanner.output_mode().await.unwrap(), OutputMode::Other(3));
    }

    #[tokio::test]
    async fn test_mock_scanner_get_info() {
        let (scanner, _handle) = MockScanner::with_name("Test Scanner".to_string(), NotificationBus::new());

        let info = scanner.get_info().await.unwrap();
        assert_eq!(info.name, "Test Scanner");
        assert_eq!(info.model, "Mock");
        assert_eq!(info.serial_number.as_deref(), Some("MOCK-0001"));
    }

    #[tokio::test]
    async fn test_mock_scanner_unplugged() {
        let (mut scanner, handle) = MockScanner::new(NotificationBus::new());
        scanner.open().await.unwrap();
        handle.set_unplugged(true);

        assert!(matches!(
            scanner.is_open().await,
            Err(HardwareError::Disconnected { .. })
        ));
        assert!(scanner.close().await.is_err());
        assert_eq!(handle.close_count(), 0);

        handle.set_unplugged(false);
        assert!(scanner.is_open().await.unwrap());
    }

    #[test]
    fn test_handle_scan_broadcasts_feedback() {
        let bus = NotificationBus::new();
        let capture = Arc::new(Capture::default());
        bus.register(ActionFilter::new(SCAN_FEEDBACK_ACTION), capture.clone());

        let (_scanner, handle) = MockScanner::new(bus);
        assert_eq!(handle.scan("A12345", 1), 1);
        assert_eq!(handle.scan_raw(b"XY".to_vec(), 9, 2), 1);

        let seen = capture.0.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].byte_array_extra(EXTRA_BARCODE), Some(&b"A12345"[..]));
        assert_eq!(seen[0].int_extra(EXTRA_LENGTH, 0), 6);
        assert_eq!(seen[1].int_extra(EXTRA_LENGTH, 0), 9);
    }
}
