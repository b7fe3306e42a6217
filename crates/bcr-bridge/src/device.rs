//! Device handle adapter.
//!
//! Wraps the scanner driver and the notification bus registration, folding
//! every driver failure into a state machine transition.

use std::sync::Arc;

use bcr_core::{Error, Result};
use bcr_hardware::{
    AnyScannerDevice, HardwareError, NotificationBus, NotificationReceiver, OutputMode, ReceiverId,
    ScannerDevice,
};
use tracing::{debug, error, info, warn};

use crate::listener::ScanListener;
use crate::state_machine::ScanStateMachine;

/// Single owner of the scanner for one bridge.
#[derive(Debug)]
pub struct DeviceHandle {
    device: AnyScannerDevice,
    bus: NotificationBus,
    machine: Arc<ScanStateMachine>,
    listener: Arc<ScanListener>,
    registration: Option<ReceiverId>,
    output_mode: OutputMode,
}

impl DeviceHandle {
    pub fn new(
        device: AnyScannerDevice,
        bus: NotificationBus,
        machine: Arc<ScanStateMachine>,
        listener: Arc<ScanListener>,
        output_mode: OutputMode,
    ) -> Self {
        Self {
            device,
            bus,
            machine,
            listener,
            registration: None,
            output_mode,
        }
    }

    /// Open and configure the scanner, then start listening for scans.
    ///
    /// A listener left over from an earlier session is unregistered first.
    /// On success the session is `Ready`; on failure it is `Error`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Init` if the scanner cannot be opened or does not
    /// accept the configured output mode, or `Error::Hardware` if the
    /// scanner is disconnected.
    pub async fn init(&mut self) -> Result<()> {
        self.release_listener();

        if let Err(e) = self.prepare().await {
            let e = Error::from(e);
            error!(error = %e, "Scanner initialization failed");
            self.machine.mark_init_failed();
            return Err(e);
        }

        match self.device.get_info().await {
            Ok(info) => info!(
                name = %info.name,
                model = %info.model,
                serial = ?info.serial_number,
                firmware = ?info.firmware_version,
                "Scanner ready"
            ),
            Err(e) => warn!(error = %e, "Scanner ready, device info unavailable"),
        }

        let receiver: Arc<dyn NotificationReceiver> = self.listener.clone();
        let id = self.bus.register(self.listener.filter(), receiver);
        self.registration = Some(id);
        self.machine.mark_ready();
        Ok(())
    }

    async fn prepare(&mut self) -> bcr_hardware::Result<()> {
        if self.device.is_open().await? {
            debug!("Scanner already open");
        } else {
            self.device.open().await?;
        }

        self.device.set_output_mode(self.output_mode).await?;
        let applied = self.device.output_mode().await?;
        if applied != self.output_mode {
            return Err(HardwareError::mode_rejected(self.output_mode, applied));
        }
        Ok(())
    }

    /// Stop listening, close the scanner and mark the session destroyed.
    ///
    /// Never fails: a scanner that is already closed is left alone and close
    /// errors are only logged.
    pub async fn destroy(&mut self) {
        self.release_listener();

        match self.device.is_open().await {
            Ok(true) => {
                if let Err(e) = self.device.close().await {
                    warn!(error = %Error::from(e), "Failed to close scanner");
                }
            }
            Ok(false) => debug!("Scanner already closed"),
            Err(e) => warn!(error = %Error::from(e), "Could not query scanner, skipping close"),
        }

        self.machine.mark_destroyed();
        info!("Scanner destroyed");
    }

    /// Unregister the scan listener if registered, leaving the scanner as is.
    pub fn release_listener(&mut self) {
        if let Some(id) = self.registration.take() {
            self.bus.unregister(id);
        }
    }

    pub fn listener_registered(&self) -> bool {
        self.registration
            .is_some_and(|id| self.bus.is_registered(id))
    }
}
