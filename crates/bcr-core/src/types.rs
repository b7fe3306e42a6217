use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a scan session.
///
/// Exactly one value exists per bridge; it is the only state shared by the
/// control path, the scan listener and the read-delivery loop. The integer
/// codes are part of the host boundary and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ScanState {
    /// Nothing happening; no session initialized yet.
    #[default]
    None = 0,
    /// A read-delivery loop is waiting for a scan.
    Reading = 1,
    /// A scan result is waiting to be delivered.
    Read = 2,
    /// Initialization, parsing or the read loop failed.
    Error = 3,
    /// The session was torn down.
    Destroyed = 4,
    /// The scanner is open and the listener registered.
    Ready = 5,
}

impl ScanState {
    /// Integer code exposed at the host boundary.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// States on which a read-delivery loop reports failure and stops.
    #[must_use]
    pub fn ends_delivery(self) -> bool {
        matches!(self, ScanState::Error | ScanState::Destroyed)
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ScanState::None => "NONE",
            ScanState::Reading => "READING",
            ScanState::Read => "READ",
            ScanState::Error => "ERROR",
            ScanState::Destroyed => "DESTROYED",
            ScanState::Ready => "READY",
        };
        write!(f, "{name}")
    }
}

/// A decoded scan as delivered to the host.
///
/// `format` is the scanner's symbology tag rendered as a signed decimal
/// byte, e.g. `"1"` or `"-3"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub text: String,
    pub format: String,
}

impl ScanResult {
    #[must_use]
    pub fn new(text: impl Into<String>, type_tag: i8) -> Self {
        Self {
            text: text.into(),
            format: type_tag.to_string(),
        }
    }
}

/// Body of a `getState` response: `{"state": <code>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReport {
    pub state: u8,
}

impl From<ScanState> for StateReport {
    fn from(state: ScanState) -> Self {
        Self { state: state.code() }
    }
}
