//! Scan notification listener.
//!
//! Turns scan feedback notifications into [`ScanResult`]s and advances the
//! state machine: a well-formed scan moves the session to `Read`, a malformed
//! one to `Error`. The listener runs on the notifier's thread, never blocks
//! and never suspends.

use std::sync::Arc;

use bcr_core::constants::{EXTRA_BARCODE, EXTRA_BARCODE_TYPE, EXTRA_LENGTH};
use bcr_core::{Error, Result, ScanResult};
use bcr_hardware::{ActionFilter, Notification, NotificationReceiver};
use tracing::{debug, error, trace};

use crate::state_machine::ScanStateMachine;

/// Extract a [`ScanResult`] from a scan feedback notification.
///
/// The declared length counts payload bytes, not characters. The text is
/// decoded from exactly that many bytes; trailing bytes are ignored, and
/// invalid UTF-8, including a multi-byte character cut by the length, is
/// replaced with U+FFFD.
///
/// # Errors
///
/// Returns `Error::Parse` if the payload is missing, the declared length is
/// negative, or the declared length exceeds the payload.
///
/// # Examples
///
/// ```
/// use bcr_bridge::listener::parse_scan_result;
/// use bcr_hardware::Notification;
///
/// let n = Notification::scan_feedback(b"A12345XX".to_vec(), 6, 1);
/// let result = parse_scan_result(&n).unwrap();
/// assert_eq!(result.text, "A12345");
/// assert_eq!(result.format, "1");
///
/// let short = Notification::scan_feedback(b"A1".to_vec(), 6, 1);
/// assert!(parse_scan_result(&short).is_err());
/// ```
pub fn parse_scan_result(notification: &Notification) -> Result<ScanResult> {
    let payload = notification
        .byte_array_extra(EXTRA_BARCODE)
        .ok_or_else(|| Error::Parse("notification carries no barcode payload".into()))?;

    let declared = notification.int_extra(EXTRA_LENGTH, 0);
    let length = usize::try_from(declared)
        .map_err(|_| Error::Parse(format!("negative barcode length {declared}")))?;

    let bytes = payload.get(..length).ok_or_else(|| {
        Error::Parse(format!(
            "declared length {length} exceeds payload of {} bytes",
            payload.len()
        ))
    })?;

    let type_tag = notification.byte_extra(EXTRA_BARCODE_TYPE, 0);
    Ok(ScanResult::new(String::from_utf8_lossy(bytes), type_tag))
}

/// Receiver registered on the notification bus for the scan feedback action.
#[derive(Debug)]
pub struct ScanListener {
    machine: Arc<ScanStateMachine>,
    action: String,
}

impl ScanListener {
    pub fn new(machine: Arc<ScanStateMachine>, action: impl Into<String>) -> Self {
        Self {
            machine,
            action: action.into(),
        }
    }

    /// Filter to register this listener under.
    pub fn filter(&self) -> ActionFilter {
        ActionFilter::new(self.action.clone())
    }
}

impl NotificationReceiver for ScanListener {
    fn on_receive(&self, notification: &Notification) {
        if notification.action() != self.action {
            trace!(action = notification.action(), "Ignoring notification");
            return;
        }

        match parse_scan_result(notification) {
            Ok(result) => {
                debug!(
                    text = %result.text,
                    format = %result.format,
                    sent_at = %notification.sent_at(),
                    "Scan received"
                );
                if !self.machine.publish(result) {
                    debug!("Scan dropped, session destroyed");
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to parse scan notification");
                self.machine.mark_parse_failed();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcr_core::ScanState;
    use bcr_core::constants::SCAN_FEEDBACK_ACTION;
    use bcr_hardware::Extra;
    use rstest::rstest;

    fn reading_listener() -> (ScanListener, Arc<ScanStateMachine>) {
        let machine = Arc::new(ScanStateMachine::new(16));
        machine.mark_ready();
        machine.begin_read().unwrap();
        let listener = ScanListener::new(Arc::clone(&machine), SCAN_FEEDBACK_ACTION);
        (listener, machine)
    }

    #[rstest]
    #[case(b"A12345", 6, "A12345")]
    #[case(b"A12345", 3, "A12")]
    #[case(b"A12345", 0, "")]
    #[case(b"0123456789012", 13, "0123456789012")]
    fn test_parse_exact_length(#[case] payload: &[u8], #[case] length: i32, #[case] text: &str) {
        let n = Notification::scan_feedback(payload.to_vec(), length, 1);
        let result = parse_scan_result(&n).unwrap();
        assert_eq!(result.text, text);
        assert_eq!(result.text.len(), length as usize);
    }

    #[rstest]
    #[case(3, "éa")]
    #[case(2, "é")]
    #[case(1, "\u{FFFD}")]
    fn test_parse_length_counts_bytes(#[case] length: i32, #[case] text: &str) {
        // "é" is two bytes in UTF-8
        let n = Notification::scan_feedback("éa".as_bytes().to_vec(), length, 1);
        assert_eq!(parse_scan_result(&n).unwrap().text, text);
    }

    #[rstest]
    #[case(b"A12345", 7)]
    #[case(b"", 1)]
    #[case(b"A12345", -1)]
    fn test_parse_bad_length(#[case] payload: &[u8], #[case] length: i32) {
        let n = Notification::scan_feedback(payload.to_vec(), length, 1);
        assert!(matches!(parse_scan_result(&n), Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_missing_payload() {
        let n = Notification::new(SCAN_FEEDBACK_ACTION).with_extra(EXTRA_LENGTH, Extra::Int(3));
        assert!(matches!(parse_scan_result(&n), Err(Error::Parse(_))));
    }

    #[test]
    fn test_parse_defaults() {
        // Missing length reads as zero, missing type as 0
        let n = Notification::new(SCAN_FEEDBACK_ACTION)
            .with_extra(EXTRA_BARCODE, Extra::Bytes(b"ABC".to_vec()));
        let result = parse_scan_result(&n).unwrap();
        assert_eq!(result.text, "");
        assert_eq!(result.format, "0");
    }

    #[test]
    fn test_parse_negative_type_tag() {
        let n = Notification::scan_feedback(b"XYZ".to_vec(), 3, -2);
        assert_eq!(parse_scan_result(&n).unwrap().format, "-2");
    }

    #[test]
    fn test_listener_publishes() {
        let (listener, machine) = reading_listener();
        listener.on_receive(&Notification::scan_feedback(b"A12345".to_vec(), 6, 1));

        assert_eq!(machine.state(), ScanState::Read);
        assert_eq!(machine.last_result(), Some(ScanResult::new("A12345", 1)));
    }

    #[test]
    fn test_listener_parse_failure_sets_error() {
        let (listener, machine) = reading_listener();
        listener.on_receive(&Notification::scan_feedback(b"A1".to_vec(), 6, 1));

        assert_eq!(machine.state(), ScanState::Error);
        assert!(machine.last_result().is_none());
    }

    #[test]
    fn test_listener_ignores_other_actions() {
        let (listener, machine) = reading_listener();
        let n = Notification::new("battery.low").with_extra(EXTRA_BARCODE, Extra::Bytes(vec![1]));
        listener.on_receive(&n);

        assert_eq!(machine.state(), ScanState::Reading);
    }

    #[test]
    fn test_listener_after_destroy() {
        let (listener, machine) = reading_listener();
        machine.mark_destroyed();
        listener.on_receive(&Notification::scan_feedback(b"A12345".to_vec(), 6, 1));
        listener.on_receive(&Notification::scan_feedback(b"A".to_vec(), 6, 1));

        assert_eq!(machine.state(), ScanState::Destroyed);
    }

    #[test]
    fn test_listener_filter() {
        let (listener, _machine) = reading_listener();
        assert!(listener.filter().matches(SCAN_FEEDBACK_ACTION));
        assert!(!listener.filter().matches("other"));
    }
}
