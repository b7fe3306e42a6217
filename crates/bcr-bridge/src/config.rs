//! Bridge configuration.
//!
//! # Example
//!
//! ```
//! use bcr_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::default().with_delivery_throttle_ms(250);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.delivery_throttle().as_millis(), 250);
//! ```

use std::time::Duration;

use bcr_core::constants::{
    DEFAULT_DELIVERY_THROTTLE_MS, DEFAULT_HISTORY_SIZE, DEFAULT_POLL_INTERVAL_MS,
    SCAN_FEEDBACK_ACTION,
};
use bcr_core::{Error, Result};
use bcr_hardware::OutputMode;
use serde::{Deserialize, Serialize};

/// Configuration for a [`BarcodeBridge`](crate::BarcodeBridge).
///
/// Missing fields take their default when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Pause between state checks while no result is pending.
    pub poll_interval_ms: u64,

    /// Pause after each delivered result.
    pub delivery_throttle_ms: u64,

    /// Notification action carrying scan payloads.
    pub feedback_action: String,

    /// Output mode the scanner must accept during `init`.
    pub output_mode: OutputMode,

    /// Number of state transitions kept for diagnostics.
    pub history_size: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            delivery_throttle_ms: DEFAULT_DELIVERY_THROTTLE_MS,
            feedback_action: SCAN_FEEDBACK_ACTION.to_string(),
            output_mode: OutputMode::Broadcast,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    /// Returns `Error::Config` if the document is malformed or fails
    /// [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the read loop cannot work with.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".into()));
        }
        if self.delivery_throttle_ms < self.poll_interval_ms {
            return Err(Error::Config(format!(
                "delivery_throttle_ms ({}) must not be shorter than poll_interval_ms ({})",
                self.delivery_throttle_ms, self.poll_interval_ms
            )));
        }
        if self.feedback_action.trim().is_empty() {
            return Err(Error::Config("feedback_action must not be empty".into()));
        }
        if self.history_size == 0 {
            return Err(Error::Config("history_size must be positive".into()));
        }
        Ok(())
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_delivery_throttle_ms(mut self, ms: u64) -> Self {
        self.delivery_throttle_ms = ms;
        self
    }

    pub fn with_feedback_action(mut self, action: impl Into<String>) -> Self {
        self.feedback_action = action.into();
        self
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    /// Poll interval as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Delivery throttle as a `Duration`.
    pub fn delivery_throttle(&self) -> Duration {
        Duration::from_millis(self.delivery_throttle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.delivery_throttle(), Duration::from_millis(500));
        assert_eq!(config.feedback_action, "scan.rcv.message");
        assert_eq!(config.output_mode, OutputMode::Broadcast);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(BridgeConfig::default().with_poll_interval_ms(0))]
    #[case(BridgeConfig::default().with_delivery_throttle_ms(10))]
    #[case(BridgeConfig::default().with_feedback_action("  "))]
    #[case(BridgeConfig::default().with_history_size(0))]
    fn test_invalid_config(#[case] config: BridgeConfig) {
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_json_partial() {
        let config = BridgeConfig::from_json_str(r#"{ "delivery_throttle_ms": 800 }"#).unwrap();
        assert_eq!(config.delivery_throttle_ms, 800);
        assert_eq!(config.poll_interval_ms, 50);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(BridgeConfig::from_json_str(r#"{ "poll_interval_ms": 0 }"#).is_err());
        assert!(BridgeConfig::from_json_str("not json").is_err());
    }
}
