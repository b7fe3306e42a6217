use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Device lifecycle errors
    #[error("Scanner initialization failed: {0}")]
    Init(String),

    #[error("Hardware operation failed: {0}")]
    Hardware(String),

    // Notification errors
    #[error("Malformed scan notification: {0}")]
    Parse(String),

    // Read loop errors
    #[error("Read loop interrupted: {0}")]
    Interrupted(String),

    // Response encoding errors
    #[error("Serialization failed: {0}")]
    Serialization(String),

    // Command errors
    #[error("Action '{action}' not supported (now) state = {state}")]
    UnsupportedAction { action: String, state: u8 },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_action_message() {
        let error = Error::UnsupportedAction {
            action: "scan".to_string(),
            state: 5,
        };
        assert_eq!(
            error.to_string(),
            "Action 'scan' not supported (now) state = 5"
        );
    }

    #[test]
    fn test_parse_error_message() {
        let error = Error::Parse("length 8 exceeds payload of 6 bytes".to_string());
        assert_eq!(
            error.to_string(),
            "Malformed scan notification: length 8 exceeds payload of 6 bytes"
        );
    }
}
