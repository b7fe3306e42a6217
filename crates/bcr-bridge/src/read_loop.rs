//! Read-delivery loop.
//!
//! A loop is started by a `read` request and owns that request's callback for
//! its whole life. Each cycle asks the state machine what to do:
//!
//! ```text
//!            ┌────────────── Pending ───────────────┐
//!            │  wait for a transition or poll tick  │
//!            ▼                                      │
//!   ┌─► take_delivery() ──────────────────────────────┘
//!   │        │
//!   │        ├── Result ──► send (keep_callback) ──► throttle pause ─┐
//!   │        │                                                      │
//!   │        └── Stop ────► send "Not Read" ──► end                 │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! A loop belongs to the session its `read` was accepted in. Once that
//! session is destroyed or replaced by a new `init`, the loop stops on its
//! next cycle.
//!
//! Pauses end early only on host shutdown, which moves the session to `Error`
//! and closes the callback with the interruption message. Otherwise the loop
//! runs until it observes `Error` or `Destroyed`; it has no timeout.

use std::sync::Arc;
use std::time::Duration;

use bcr_core::constants::MSG_NOT_READ;
use bcr_core::{Error, Result, ScanResult};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::callback::{CallbackContext, PluginResult};
use crate::state_machine::{Delivery, ScanStateMachine, SessionId};

/// One read-delivery loop, bound to a single `read` callback.
#[derive(Debug)]
pub struct ReadLoop {
    machine: Arc<ScanStateMachine>,
    session: SessionId,
    callback: CallbackContext,
    poll_interval: Duration,
    delivery_throttle: Duration,
    interrupt: CancellationToken,
}

impl ReadLoop {
    /// Create a loop for `session`, as returned by
    /// [`ScanStateMachine::begin_read`].
    pub fn new(
        machine: Arc<ScanStateMachine>,
        session: SessionId,
        callback: CallbackContext,
        poll_interval: Duration,
        delivery_throttle: Duration,
        interrupt: CancellationToken,
    ) -> Self {
        Self {
            machine,
            session,
            callback,
            poll_interval,
            delivery_throttle,
            interrupt,
        }
    }

    /// Run until the session ends or the loop is interrupted.
    ///
    /// Always closes the callback with a final failure before returning.
    ///
    /// # Errors
    ///
    /// Returns `Error::Interrupted` if a pause was cut short, or
    /// `Error::Serialization` if a result could not be encoded.
    pub async fn run(self) -> Result<()> {
        let mut watcher = self.machine.subscribe();
        info!(session = ?self.session, "Read loop started");

        loop {
            // Mark the current session as seen before inspecting it, so any
            // later transition wakes the wait below.
            watcher.borrow_and_update();

            match self.machine.take_delivery(self.session) {
                Delivery::Result(result) => {
                    self.deliver(result)?;
                    if let Err(e) = self.pause(self.delivery_throttle).await {
                        return Err(self.interrupted(e));
                    }
                }
                Delivery::Stop(state) => {
                    info!(%state, "Read loop stopping");
                    self.callback.error(MSG_NOT_READ);
                    return Ok(());
                }
                Delivery::Pending => {
                    tokio::select! {
                        biased;
                        _ = self.interrupt.cancelled() => {
                            return Err(self.interrupted(Error::Interrupted("host shutdown".into())));
                        }
                        changed = watcher.changed() => {
                            if changed.is_err() {
                                return Err(self.interrupted(Error::Interrupted("state machine dropped".into())));
                            }
                        }
                        _ = sleep(self.poll_interval) => {}
                    }
                }
            }
        }
    }

    fn deliver(&self, result: ScanResult) -> Result<()> {
        let value = match serde_json::to_value(&result) {
            Ok(value) => value,
            Err(e) => {
                let e = Error::from(e);
                warn!(error = %e, "Failed to encode scan result");
                self.machine.mark_error();
                self.callback.error(e.to_string());
                return Err(e);
            }
        };

        debug!(text = %result.text, format = %result.format, "Delivering scan result");
        self.callback
            .send(PluginResult::ok_json(value).with_keep_callback(true));
        Ok(())
    }

    async fn pause(&self, duration: Duration) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.interrupt.cancelled() => Err(Error::Interrupted("host shutdown".into())),
            _ = sleep(duration) => Ok(()),
        }
    }

    fn interrupted(&self, e: Error) -> Error {
        warn!(error = %e, "Read loop interrupted");
        self.machine.mark_error();
        self.callback.error(e.to_string());
        e
    }
}
