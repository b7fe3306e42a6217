//! Boundary constants for the barcode reader bridge.
//!
//! This module centralizes every literal that crosses the host boundary:
//! action names understood by the command surface, the notification action
//! and extra keys used by the scanner firmware, the messages reported to
//! failure callbacks, and the default timing of the read-delivery loop.
//!
//! # Command Surface
//!
//! | Action | Constant |
//! |--------|----------|
//! | `init` | [`ACTION_INIT`] |
//! | `destroy` | [`ACTION_DESTROY`] |
//! | `read` | [`ACTION_READ`] |
//! | `getState` | [`ACTION_GET_STATE`] |
//!
//! # Usage
//!
//! ```
//! use bcr_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(ACTION_READ, "read");
//! let poll = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
//! assert_eq!(poll.as_millis(), 50);
//! ```
//!
//! # Firmware Compatibility
//!
//! The notification action and extra keys are fixed by the scanner firmware.
//! [`EXTRA_BARCODE`] in particular is spelled `barocode` on the device and
//! must not be corrected.

// ============================================================================
// Command Actions
// ============================================================================

/// Opens the scanner and registers the scan listener.
pub const ACTION_INIT: &str = "init";

/// Unregisters the listener, closes the scanner and ends the session.
pub const ACTION_DESTROY: &str = "destroy";

/// Starts a read-delivery loop bound to the request's callback.
pub const ACTION_READ: &str = "read";

/// Reports the current scan state as `{"state": <int>}`.
pub const ACTION_GET_STATE: &str = "getState";

// ============================================================================
// Scan Notification
// ============================================================================

/// Action name of the scan feedback notification broadcast by the scanner.
///
/// # Examples
///
/// ```
/// use bcr_core::constants::SCAN_FEEDBACK_ACTION;
///
/// assert_eq!(SCAN_FEEDBACK_ACTION, "scan.rcv.message");
/// ```
pub const SCAN_FEEDBACK_ACTION: &str = "scan.rcv.message";

/// Extra key holding the raw barcode bytes (firmware spelling).
pub const EXTRA_BARCODE: &str = "barocode";

/// Extra key holding the declared barcode length.
pub const EXTRA_LENGTH: &str = "length";

/// Extra key holding the one-byte symbology tag.
pub const EXTRA_BARCODE_TYPE: &str = "barcodeType";

// ============================================================================
// Callback Messages
// ============================================================================

/// Failure message for a rejected `init`.
pub const MSG_INIT_FAILED: &str = "Init Failed";

/// Final failure message of a read loop that observed `ERROR` or `DESTROYED`.
pub const MSG_NOT_READ: &str = "Not Read";

// ============================================================================
// Timing
// ============================================================================

/// Default pause between state checks while no result is pending (ms).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Default pause after each delivered result (ms).
///
/// Throttles delivery so the same payload is not redelivered faster than the
/// scanner can refresh it.
pub const DEFAULT_DELIVERY_THROTTLE_MS: u64 = 500;

/// Default number of state transitions kept for diagnostics.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_exceeds_poll_interval() {
        const { assert!(DEFAULT_DELIVERY_THROTTLE_MS > DEFAULT_POLL_INTERVAL_MS) };
    }
}
