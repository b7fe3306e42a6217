//! Host-facing command surface.
//!
//! The host sends named actions, each with its own callback. `init`,
//! `destroy` and `getState` answer once; `read` spawns a [`ReadLoop`] that
//! keeps answering on the same callback until the session ends.
//!
//! # Examples
//!
//! ```
//! use bcr_bridge::{BarcodeBridge, BridgeConfig};
//! use bcr_hardware::mock::MockScanner;
//! use bcr_hardware::notification::NotificationBus;
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> bcr_core::Result<()> {
//! let bus = NotificationBus::new();
//! let (scanner, handle) = MockScanner::new(bus.clone());
//! let bridge = BarcodeBridge::new(scanner.into(), bus, BridgeConfig::default())?;
//!
//! assert!(bridge.call("init").await.next().await.unwrap().is_ok());
//!
//! let mut results = bridge.call("read").await;
//! handle.scan("A12345", 1);
//! let first = results.next().await.unwrap();
//! assert_eq!(first.json().unwrap()["text"], "A12345");
//!
//! bridge.call("destroy").await;
//! assert_eq!(results.next().await.unwrap().message(), Some("Not Read"));
//! bridge.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bcr_core::constants::{
    ACTION_DESTROY, ACTION_GET_STATE, ACTION_INIT, ACTION_READ, MSG_INIT_FAILED,
};
use bcr_core::{Error, Result, ScanState, StateReport};
use bcr_hardware::{AnyScannerDevice, NotificationBus};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::callback::{CallbackContext, ResponseStream};
use crate::config::BridgeConfig;
use crate::device::DeviceHandle;
use crate::listener::ScanListener;
use crate::read_loop::ReadLoop;
use crate::state_machine::{ScanStateMachine, SessionId, StateTransition};

/// Actions understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Init,
    Destroy,
    Read,
    GetState,
}

impl Action {
    /// Look up an action by its wire name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            ACTION_INIT => Some(Self::Init),
            ACTION_DESTROY => Some(Self::Destroy),
            ACTION_READ => Some(Self::Read),
            ACTION_GET_STATE => Some(Self::GetState),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => ACTION_INIT,
            Self::Destroy => ACTION_DESTROY,
            Self::Read => ACTION_READ,
            Self::GetState => ACTION_GET_STATE,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a read loop task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopTermination {
    /// Loop observed `Error` or `Destroyed` and reported "Not Read".
    Stopped,
    /// Loop was interrupted or failed to encode a result.
    Failed,
    /// Task was aborted.
    Cancelled,
    /// Task panicked.
    Panic,
}

impl LoopTermination {
    fn classify(result: std::result::Result<Result<()>, JoinError>) -> Self {
        match result {
            Ok(Ok(())) => Self::Stopped,
            Ok(Err(_)) => Self::Failed,
            Err(e) if e.is_cancelled() => Self::Cancelled,
            Err(_) => Self::Panic,
        }
    }
}

/// Bridge between a host application and one barcode scanner.
#[derive(Debug)]
pub struct BarcodeBridge {
    machine: Arc<ScanStateMachine>,
    device: tokio::sync::Mutex<DeviceHandle>,
    config: BridgeConfig,
    interrupt: CancellationToken,
    readers: Mutex<JoinSet<Result<()>>>,
}

impl BarcodeBridge {
    /// Create a bridge for `device`, listening for scans on `bus`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` does not validate.
    pub fn new(
        device: AnyScannerDevice,
        bus: NotificationBus,
        config: BridgeConfig,
    ) -> Result<Self> {
        config.validate()?;

        let machine = Arc::new(ScanStateMachine::new(config.history_size));
        let listener = Arc::new(ScanListener::new(
            Arc::clone(&machine),
            config.feedback_action.clone(),
        ));
        let device = DeviceHandle::new(
            device,
            bus,
            Arc::clone(&machine),
            listener,
            config.output_mode,
        );

        Ok(Self {
            machine,
            device: tokio::sync::Mutex::new(device),
            config,
            interrupt: CancellationToken::new(),
            readers: Mutex::new(JoinSet::new()),
        })
    }

    /// Handle one host request, answering on `callback`.
    ///
    /// Unknown actions, and `read` while a read is active or after
    /// `destroy`, are answered with the "not supported" message and leave
    /// the state unchanged.
    pub async fn execute(&self, action: &str, callback: CallbackContext) {
        debug!(action, "Executing action");

        let Some(parsed) = Action::parse(action) else {
            self.reject(action, self.machine.state(), &callback);
            return;
        };

        match parsed {
            Action::Init => {
                let mut device = self.device.lock().await;
                match device.init().await {
                    Ok(()) => {
                        callback.success();
                    }
                    Err(e) => {
                        error!(error = %e, "Init failed");
                        callback.error(MSG_INIT_FAILED);
                    }
                }
            }
            Action::Destroy => {
                self.device.lock().await.destroy().await;
                callback.success();
            }
            Action::Read => match self.machine.begin_read() {
                Ok(session) => self.spawn_reader(session, callback),
                Err(state) => self.reject(action, state, &callback),
            },
            Action::GetState => {
                let report = StateReport::from(self.machine.state());
                match serde_json::to_value(report) {
                    Ok(value) => {
                        callback.success_with(value);
                    }
                    Err(e) => {
                        let e = Error::from(e);
                        error!(error = %e, "Failed to encode state");
                        self.machine.mark_error();
                        callback.error(e.to_string());
                    }
                }
            }
        }
    }

    /// Execute `action` on a fresh callback and return its responses.
    pub async fn call(&self, action: &str) -> ResponseStream {
        let (callback, responses) = CallbackContext::channel();
        self.execute(action, callback).await;
        responses
    }

    fn reject(&self, action: &str, state: ScanState, callback: &CallbackContext) {
        let e = Error::UnsupportedAction {
            action: action.to_string(),
            state: state.code(),
        };
        warn!(error = %e, "Rejected action");
        callback.error(e.to_string());
    }

    fn spawn_reader(&self, session: SessionId, callback: CallbackContext) {
        let read_loop = ReadLoop::new(
            Arc::clone(&self.machine),
            session,
            callback,
            self.config.poll_interval(),
            self.config.delivery_throttle(),
            self.interrupt.child_token(),
        );

        let mut readers = self.readers();
        while let Some(result) = readers.try_join_next() {
            debug!(termination = ?LoopTermination::classify(result), "Reaped read loop");
        }
        readers.spawn(read_loop.run());
    }

    fn readers(&self) -> MutexGuard<'_, JoinSet<Result<()>>> {
        self.readers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current session state.
    pub fn state(&self) -> ScanState {
        self.machine.state()
    }

    /// Recent state transitions, oldest first.
    pub fn history(&self) -> Vec<StateTransition> {
        self.machine.history()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Number of read loops that have not been reaped yet.
    pub fn active_readers(&self) -> usize {
        self.readers().len()
    }

    /// Tear the bridge down with the host process.
    ///
    /// Stops listening for scans without closing the scanner, interrupts
    /// every read loop and waits for them to finish. Interrupted loops
    /// close their callbacks with the interruption message. The session
    /// ends `Destroyed`.
    pub async fn shutdown(self) {
        info!("Shutting down barcode bridge");

        self.device.lock().await.release_listener();
        self.interrupt.cancel();

        let mut readers = self
            .readers
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        let mut stopped = 0;
        let mut failed = 0;
        let mut cancelled = 0;
        let mut panicked = 0;
        while let Some(result) = readers.join_next().await {
            match LoopTermination::classify(result) {
                LoopTermination::Stopped => stopped += 1,
                LoopTermination::Failed => failed += 1,
                LoopTermination::Cancelled => cancelled += 1,
                LoopTermination::Panic => panicked += 1,
            }
        }

        self.machine.mark_destroyed();

        if panicked > 0 {
            error!(panicked, "Read loop panicked");
        }
        info!(stopped, failed, cancelled, "Barcode bridge shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("init", Some(Action::Init))]
    #[case("destroy", Some(Action::Destroy))]
    #[case("read", Some(Action::Read))]
    #[case("getState", Some(Action::GetState))]
    #[case("getstate", None)]
    #[case("", None)]
    fn test_action_parse(#[case] name: &str, #[case] expected: Option<Action>) {
        assert_eq!(Action::parse(name), expected);
        if let Some(action) = expected {
            assert_eq!(action.as_str(), name);
            assert_eq!(action.to_string(), name);
        }
    }

    #[rstest]
    #[case(Ok(Ok(())), LoopTermination::Stopped)]
    #[case(Ok(Err(Error::Interrupted("host shutdown".into()))), LoopTermination::Failed)]
    fn test_classify(
        #[case] result: std::result::Result<Result<()>, JoinError>,
        #[case] expected: LoopTermination,
    ) {
        assert_eq!(LoopTermination::classify(result), expected);
    }

    #[tokio::test]
    async fn test_classify_join_errors() {
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        tasks.spawn(async {
            if true {
                panic!("boom");
            }
            Ok(())
        });
        let panicked = tasks.join_next().await.unwrap();
        assert_eq!(LoopTermination::classify(panicked), LoopTermination::Panic);

        tasks.spawn(std::future::pending());
        tasks.abort_all();
        let aborted = tasks.join_next().await.unwrap();
        assert_eq!(LoopTermination::classify(aborted), LoopTermination::Cancelled);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let bus = NotificationBus::new();
        let (scanner, _handle) = bcr_hardware::mock::MockScanner::new(bus.clone());
        let config = BridgeConfig::default().with_poll_interval_ms(0);

        assert!(matches!(
            BarcodeBridge::new(scanner.into(), bus, config),
            Err(Error::Config(_))
        ));
    }
}
