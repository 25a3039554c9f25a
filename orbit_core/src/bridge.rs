use crossbeam_channel::Receiver;

use orbit_shared::{
    num_events_param, DeviceCommand, DeviceEvent, DeviceTime, NoteSlot, Target,
};

use crate::device::DeviceHandle;
use crate::store::{ActiveMask, NoteStore};
use crate::window::WindowState;

/// Lifecycle of the device connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Connecting,
    Ready,
    Error,
    Closed,
}

/// Keeps the external device in step with local sequencer state.
///
/// Outbound: every core mutation that is in scope for the device turns
/// into a command or parameter write. Inbound: the bridge owns the sole
/// receiver for the device's event stream and drains it on demand.
///
/// Failures never roll back local state. The UI's view is authoritative;
/// a device that missed an update lags until the next resync covers it.
pub struct DeviceSyncBridge {
    device: Option<Box<dyn DeviceHandle>>,
    events_rx: Option<Receiver<DeviceEvent>>,
    state: ConnectionState,
    resync_done: bool,
}

impl DeviceSyncBridge {
    pub fn new() -> Self {
        Self {
            device: None,
            events_rx: None,
            state: ConnectionState::Uninitialized,
            resync_done: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// Attach a device and begin connecting. Returns false once closed.
    pub fn connect(&mut self, device: Box<dyn DeviceHandle>) -> bool {
        if self.state == ConnectionState::Closed {
            log::warn!("bridge: connect after close ignored");
            return false;
        }
        self.events_rx = Some(device.events());
        self.device = Some(device);
        self.state = ConnectionState::Connecting;
        log::info!("bridge: connecting to device");
        true
    }

    /// The device finished its own setup. Returns true on the transition
    /// into Ready.
    pub fn mark_ready(&mut self) -> bool {
        if self.state != ConnectionState::Connecting {
            log::warn!("bridge: mark_ready in state {:?} ignored", self.state);
            return false;
        }
        self.state = ConnectionState::Ready;
        log::info!("bridge: device ready");
        true
    }

    /// The device reported a fault; commands stop until reconnect
    pub fn mark_error(&mut self) {
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Ready
        ) {
            log::warn!("bridge: device entered error state");
            self.state = ConnectionState::Error;
        }
    }

    /// Tear down for good. Terminal.
    pub fn close(&mut self) {
        self.device = None;
        self.events_rx = None;
        self.state = ConnectionState::Closed;
        log::info!("bridge: closed");
    }

    /// Whether the one-time full resync is still owed for this session
    pub fn needs_initial_sync(&self) -> bool {
        self.is_ready() && !self.resync_done
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.device.as_ref()?.parameter(name)
    }

    /// Parameter write, gated on Ready. Failures are logged and swallowed.
    pub fn write_param(&self, name: &str, value: f64) {
        if !self.is_ready() {
            log::debug!("bridge: param {} skipped, device not ready", name);
            return;
        }
        if let Some(device) = &self.device {
            if let Err(e) = device.set_parameter(name, value) {
                log::warn!("bridge: param write {} = {} failed: {}", name, value, e);
            }
        }
    }

    fn send(&self, command: DeviceCommand) {
        if !self.is_ready() {
            log::debug!("bridge: {} skipped, device not ready", command.tag());
            return;
        }
        if let Some(device) = &self.device {
            if let Err(e) = device.schedule_command(DeviceTime::Now, command) {
                log::warn!("bridge: send failed: {}", e);
            }
        }
    }

    /// Note writes always go out with the absolute index
    pub fn send_note(&self, index: usize, slot: NoteSlot) {
        self.send(DeviceCommand::UpdateNote {
            index,
            pitch: slot.pitch,
            velocity: slot.velocity,
        });
    }

    /// Active writes are window-relative; a slot outside the target's
    /// window is suppressed (it gets re-sent when a window move covers
    /// it). Returns whether a command went out.
    pub fn send_active(
        &self,
        target: Target,
        window: WindowState,
        absolute: usize,
        active: bool,
    ) -> bool {
        match window.to_relative(absolute) {
            Some(relative_index) => {
                self.send(DeviceCommand::UpdateActive {
                    target,
                    relative_index,
                    active,
                });
                true
            }
            None => {
                log::debug!(
                    "bridge: active[{}] for {} outside window {}..{}, suppressed",
                    absolute,
                    target,
                    window.start_index,
                    window.end()
                );
                false
            }
        }
    }

    pub fn send_start_index(&self, target: Target, start_index: usize) {
        self.send(DeviceCommand::StartIndex {
            target,
            start_index,
        });
    }

    /// Re-send one target's window position and every active flag inside
    /// its (new) window. Run after any window move or resize so that
    /// edits made while a slot was out of the window heal.
    pub fn resync_window(&self, target: Target, window: WindowState, mask: &ActiveMask) {
        self.send_start_index(target, window.start_index);
        for absolute in window.indices() {
            if let Ok(active) = mask.get(absolute) {
                self.send_active(target, window, absolute, active);
            }
        }
    }

    /// One-time full resync, run on the first transition into Ready:
    /// every note slot, then per target every in-window active flag and
    /// the window position. Idempotent; later Ready transitions after an
    /// error recovery do not repeat it.
    pub fn full_resync(
        &mut self,
        notes: &NoteStore,
        masks: &[ActiveMask; 2],
        windows: &[WindowState; 2],
    ) {
        if self.resync_done || !self.is_ready() {
            return;
        }
        log::info!("bridge: full resync ({} slots)", notes.len());

        for (index, slot) in notes.iter() {
            self.send_note(index, slot);
        }
        for target in Target::ALL {
            let window = windows[target.index()];
            let mask = &masks[target.index()];
            for absolute in window.indices() {
                if let Ok(active) = mask.get(absolute) {
                    self.send_active(target, window, absolute, active);
                }
            }
            self.send_start_index(target, window.start_index);
            self.write_param(num_events_param(target), window.num_events as f64);
        }
        self.resync_done = true;
    }

    /// Drain everything the device has emitted since the last call.
    /// Handlers run synchronously downstream; rapid events simply arrive
    /// back-to-back in the returned batch.
    pub fn poll_events(&mut self) -> Vec<DeviceEvent> {
        match &self.events_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        }
    }
}

impl Default for DeviceSyncBridge {
    fn default() -> Self {
        Self::new()
    }
}
