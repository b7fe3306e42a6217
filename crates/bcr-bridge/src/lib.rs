//! Barcode reader bridge.
//!
//! This crate exposes a scanner to a host application through four actions
//! (`init`, `destroy`, `read`, `getState`) answered on per-request callbacks.
//! Three actors share one scan session:
//!
//! - the host, issuing actions through [`BarcodeBridge::execute`];
//! - the [`ScanListener`], fed by the notification bus whenever the scanner
//!   captures a barcode;
//! - one [`ReadLoop`] per active `read`, delivering results to its callback.
//!
//! All of them go through [`ScanStateMachine`], which serializes every
//! transition.

pub mod bridge;
pub mod callback;
pub mod config;
pub mod device;
pub mod listener;
pub mod read_loop;
pub mod state_machine;

pub use bridge::{Action, BarcodeBridge};
pub use callback::{CallbackContext, Payload, PluginResult, ResponseStream, Status};
pub use config::BridgeConfig;
pub use device::DeviceHandle;
pub use listener::{ScanListener, parse_scan_result};
pub use read_loop::ReadLoop;
pub use state_machine::{Delivery, ScanStateMachine, SessionId, StateTransition};
