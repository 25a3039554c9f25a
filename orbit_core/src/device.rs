use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use orbit_shared::{DeviceCommand, DeviceError, DeviceEvent, DeviceTime};

/// Contract to the audio device. The core never reaches past this
/// surface: a command scheduler, a keyed parameter table and an event
/// stream. Implementations are injected into the orchestrator; there is
/// no ambient device global.
pub trait DeviceHandle {
    /// Schedule a tagged command at the given logical time
    fn schedule_command(&self, at: DeviceTime, command: DeviceCommand) -> Result<(), DeviceError>;

    /// Write a named numeric parameter
    fn set_parameter(&self, name: &str, value: f64) -> Result<(), DeviceError>;

    /// Read a named numeric parameter
    fn parameter(&self, name: &str) -> Option<f64>;

    /// The device's asynchronous event stream. The bridge holds the sole
    /// receiver and drains it synchronously.
    fn events(&self) -> Receiver<DeviceEvent>;
}

impl<T: DeviceHandle + ?Sized> DeviceHandle for Rc<T> {
    fn schedule_command(&self, at: DeviceTime, command: DeviceCommand) -> Result<(), DeviceError> {
        (**self).schedule_command(at, command)
    }

    fn set_parameter(&self, name: &str, value: f64) -> Result<(), DeviceError> {
        (**self).set_parameter(name, value)
    }

    fn parameter(&self, name: &str) -> Option<f64> {
        (**self).parameter(name)
    }

    fn events(&self) -> Receiver<DeviceEvent> {
        (**self).events()
    }
}

/// In-process device double: records every scheduled command, keeps a
/// plain parameter table and lets callers inject events into the stream.
/// Used by the headless binary and the sync tests in place of the real
/// rendering engine.
pub struct LoopbackDevice {
    commands: RefCell<Vec<(DeviceTime, DeviceCommand)>>,
    parameters: RefCell<HashMap<String, f64>>,
    fail_sends: Cell<bool>,
    event_tx: Sender<DeviceEvent>,
    event_rx: Receiver<DeviceEvent>,
}

impl LoopbackDevice {
    pub fn new() -> Rc<Self> {
        let (event_tx, event_rx) = unbounded();
        Rc::new(Self {
            commands: RefCell::new(Vec::new()),
            parameters: RefCell::new(HashMap::new()),
            fail_sends: Cell::new(false),
            event_tx,
            event_rx,
        })
    }

    /// Seed a parameter before the core connects (a device preset)
    pub fn define_parameter(&self, name: &str, value: f64) {
        self.parameters.borrow_mut().insert(name.to_string(), value);
    }

    /// Inject an event as if the engine emitted it
    pub fn emit(&self, event: DeviceEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Make every subsequent schedule_command fail
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.set(fail);
    }

    /// Drain and return every command scheduled so far
    pub fn take_sent(&self) -> Vec<DeviceCommand> {
        self.commands
            .borrow_mut()
            .drain(..)
            .map(|(_, cmd)| cmd)
            .collect()
    }

    pub fn sent_count(&self) -> usize {
        self.commands.borrow().len()
    }
}

impl DeviceHandle for LoopbackDevice {
    fn schedule_command(&self, at: DeviceTime, command: DeviceCommand) -> Result<(), DeviceError> {
        if self.fail_sends.get() {
            return Err(DeviceError::SendFailed {
                tag: command.tag().to_string(),
                reason: "loopback configured to fail".to_string(),
            });
        }
        self.commands.borrow_mut().push((at, command));
        Ok(())
    }

    fn set_parameter(&self, name: &str, value: f64) -> Result<(), DeviceError> {
        self.parameters.borrow_mut().insert(name.to_string(), value);
        Ok(())
    }

    fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.borrow().get(name).copied()
    }

    fn events(&self) -> Receiver<DeviceEvent> {
        self.event_rx.clone()
    }
}
