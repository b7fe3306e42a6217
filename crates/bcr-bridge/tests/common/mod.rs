//! Shared fixtures for bridge integration tests.
//!
//! Every fixture wires a [`MockScanner`] and a [`BarcodeBridge`] to the same
//! [`NotificationBus`], so tests drive scans through the mock handle exactly
//! as the scanner firmware would.

use bcr_bridge::{BarcodeBridge, BridgeConfig, PluginResult, ResponseStream, Status};
use bcr_hardware::mock::{MockScanner, MockScannerHandle};
use bcr_hardware::notification::NotificationBus;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Fixture {
    pub bridge: BarcodeBridge,
    pub scanner: MockScannerHandle,
    pub bus: NotificationBus,
}

pub fn mock_bridge() -> Fixture {
    mock_bridge_with(BridgeConfig::default())
}

pub fn mock_bridge_with(config: BridgeConfig) -> Fixture {
    init_tracing();
    let bus = NotificationBus::new();
    let (device, scanner) = MockScanner::new(bus.clone());
    let bridge = BarcodeBridge::new(device.into(), bus.clone(), config)
        .expect("test config is valid");
    Fixture {
        bridge,
        scanner,
        bus,
    }
}

/// Bridge that has already answered `init` successfully.
pub async fn ready_bridge() -> Fixture {
    let fixture = mock_bridge();
    let result = single(fixture.bridge.call("init").await).await;
    assert!(result.is_ok(), "init failed: {result:?}");
    fixture
}

/// Await the only response of a one-shot action.
pub async fn single(mut responses: ResponseStream) -> PluginResult {
    let result = responses.next().await.expect("action answered");
    assert!(!result.keep_callback, "one-shot action kept its callback");
    assert!(responses.next().await.is_none());
    result
}

/// Await a final failure and return its message.
pub async fn final_error(responses: &mut ResponseStream) -> String {
    let result = responses.next().await.expect("callback closed without a result");
    assert_eq!(result.status, Status::Error, "expected failure, got {result:?}");
    assert!(!result.keep_callback);
    assert!(responses.next().await.is_none());
    result.message().unwrap_or_default().to_string()
}

/// Query `getState` and return the reported code.
pub async fn state_code(bridge: &BarcodeBridge) -> u64 {
    let result = single(bridge.call("getState").await).await;
    assert!(result.is_ok());
    result
        .json()
        .and_then(|v| v["state"].as_u64())
        .expect("state report carries a code")
}
