use orbit_shared::{
    num_corners_param, num_events_param, DeviceEvent, ListenerId, NoteSlot, SeqConfig, Target,
    DEFAULT_MASTER_VOLUME, DEFAULT_NUM_CORNERS, DEFAULT_WINDOW_EVENTS, PARAM_VOLUME,
};

use crate::bridge::{ConnectionState, DeviceSyncBridge};
use crate::device::DeviceHandle;
use crate::store::{ActiveMask, NoteStore};
use crate::triggers::TriggerRouter;
use crate::visual::{VisualEvent, VisualMirror};
use crate::window::{WindowManager, WindowState};

/// Composition root for the sequencer core. The host application builds
/// exactly one of these, injects a device handle, and reaches every
/// operation through it; nothing here is global.
///
/// Single-threaded by design: UI mutations run to completion before
/// returning, and device events are applied when the host drains them
/// with [`process_device_events`](Self::process_device_events).
pub struct Orchestrator {
    config: SeqConfig,
    notes: NoteStore,
    active: [ActiveMask; 2],
    windows: [WindowManager; 2],
    mirror: VisualMirror,
    router: TriggerRouter,
    bridge: DeviceSyncBridge,
    num_corners: [u32; 2],
    master_volume: f64,
    telemetry: Option<Box<dyn FnMut(&DeviceEvent)>>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_config(SeqConfig::default())
    }

    pub fn with_config(config: SeqConfig) -> Self {
        let notes = NoteStore::with_default_pattern(config.slots);
        let mut mirror = VisualMirror::new(config.slots);
        for (index, slot) in notes.iter() {
            mirror.set_pitch(index, slot.pitch);
            mirror.set_active(index, true);
        }

        Self {
            notes,
            active: [
                ActiveMask::new(config.slots, true),
                ActiveMask::new(config.slots, true),
            ],
            windows: [
                WindowManager::new(config.slots, config.min_window, DEFAULT_WINDOW_EVENTS[0]),
                WindowManager::new(config.slots, config.min_window, DEFAULT_WINDOW_EVENTS[1]),
            ],
            mirror,
            router: TriggerRouter::new(),
            bridge: DeviceSyncBridge::new(),
            num_corners: [DEFAULT_NUM_CORNERS; 2],
            master_volume: DEFAULT_MASTER_VOLUME,
            telemetry: None,
            config,
        }
    }

    pub fn config(&self) -> SeqConfig {
        self.config
    }

    // --- note and activity mutations (UI → core → device) ---

    /// Overwrite a note slot. Out-of-range indices are dropped here so
    /// the error never reaches the UI.
    pub fn set_note(&mut self, index: usize, slot: NoteSlot) {
        if let Err(e) = self.notes.set(index, slot) {
            log::warn!("set_note: {}", e);
            return;
        }
        self.mirror.set_pitch(index, slot.pitch);
        self.bridge.send_note(index, slot);
    }

    pub fn note(&self, index: usize) -> Option<NoteSlot> {
        self.notes.get(index).ok()
    }

    /// Set one target's active flag for a slot, addressed absolutely
    pub fn set_active(&mut self, index: usize, active: bool, target: Target) {
        if let Err(e) = self.active[target.index()].set(index, active) {
            log::warn!("set_active: {}", e);
            return;
        }
        self.mirror.set_active(index, self.combined_active(index));
        self.bridge
            .send_active(target, self.windows[target.index()].state(), index, active);
    }

    pub fn toggle_active(&mut self, index: usize, target: Target) {
        match self.active[target.index()].get(index) {
            Ok(current) => self.set_active(index, !current, target),
            Err(e) => log::warn!("toggle_active: {}", e),
        }
    }

    pub fn is_active(&self, index: usize, target: Target) -> bool {
        self.active[target.index()].get(index).unwrap_or(false)
    }

    fn combined_active(&self, index: usize) -> bool {
        Target::ALL
            .iter()
            .any(|t| self.active[t.index()].get(index).unwrap_or(false))
    }

    // --- windows ---

    pub fn window(&self, target: Target) -> WindowState {
        self.windows[target.index()].state()
    }

    /// Resize a target's window. The request is clamped; the applied size
    /// is returned so callers can react to silent adjustment.
    pub fn set_num_events(&mut self, target: Target, num_events: usize) -> usize {
        let applied = self.windows[target.index()].set_num_events(num_events);
        self.bridge
            .write_param(num_events_param(target), applied as f64);
        self.bridge.resync_window(
            target,
            self.windows[target.index()].state(),
            &self.active[target.index()],
        );
        applied
    }

    /// Move a target's window. The request is clamped; the applied start
    /// index is returned.
    pub fn set_start_index(&mut self, target: Target, start_index: usize) -> usize {
        let applied = self.windows[target.index()].set_start_index(start_index);
        self.bridge.resync_window(
            target,
            self.windows[target.index()].state(),
            &self.active[target.index()],
        );
        applied
    }

    // --- cosmetic / device-only parameters ---

    pub fn set_num_corners(&mut self, target: Target, corners: u32) {
        self.num_corners[target.index()] = corners;
        self.bridge
            .write_param(num_corners_param(target), corners as f64);
    }

    pub fn num_corners(&self, target: Target) -> u32 {
        self.num_corners[target.index()]
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = volume.clamp(0.0, 1.0);
        self.bridge.write_param(PARAM_VOLUME, self.master_volume);
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    // --- device lifecycle ---

    pub fn connect(&mut self, device: Box<dyn DeviceHandle>) -> bool {
        self.bridge.connect(device)
    }

    /// The device finished its setup. On the first Ready the orchestrator
    /// adopts window sizes and corner counts from the device's parameter
    /// table (a preset may define them), then pushes the one-time full
    /// resync.
    pub fn device_ready(&mut self) {
        if !self.bridge.mark_ready() {
            return;
        }
        if self.bridge.needs_initial_sync() {
            self.adopt_device_parameters();
            let windows = [self.windows[0].state(), self.windows[1].state()];
            self.bridge.full_resync(&self.notes, &self.active, &windows);
        }
    }

    pub fn device_error(&mut self) {
        self.bridge.mark_error();
    }

    pub fn close(&mut self) {
        self.bridge.close();
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.bridge.state()
    }

    fn adopt_device_parameters(&mut self) {
        for target in Target::ALL {
            if let Some(v) = self.bridge.parameter(num_events_param(target)) {
                if v.is_finite() {
                    let applied = self.windows[target.index()].set_num_events(v.round() as usize);
                    log::info!("adopted numEvents_{} = {} from device", target, applied);
                }
            }
            if let Some(v) = self.bridge.parameter(num_corners_param(target)) {
                if v.is_finite() && v >= 0.0 {
                    self.num_corners[target.index()] = v.round() as u32;
                }
            }
        }
    }

    // --- inbound events ---

    /// Drain the device's event stream and apply it: triggers pulse the
    /// mirror and fan out to listeners, everything else goes to the
    /// telemetry callback untouched.
    pub fn process_device_events(&mut self) {
        for event in self.bridge.poll_events() {
            match event.as_trigger() {
                Some((target, relative)) => self.handle_trigger(target, relative),
                None => {
                    if let Some(cb) = &mut self.telemetry {
                        cb(&event);
                    }
                }
            }
        }
    }

    /// Resolve a device trigger against the window as it stands at
    /// receipt. Listeners get the device's own relative index.
    fn handle_trigger(&mut self, target: Target, relative: usize) {
        let window = self.windows[target.index()].state();
        if relative >= window.num_events {
            log::warn!(
                "trigger_{} index {} outside window of {} events, dropped",
                target,
                relative,
                window.num_events
            );
            return;
        }
        let absolute = window.to_absolute(relative);
        self.mirror.trigger(absolute);
        self.router.dispatch(target, relative);
    }

    /// Observer for non-trigger device events (angle telemetry and any
    /// future tags)
    pub fn on_telemetry(&mut self, callback: impl FnMut(&DeviceEvent) + 'static) {
        self.telemetry = Some(Box::new(callback));
    }

    // --- listeners / visual surface ---

    pub fn register_trigger_listener(
        &mut self,
        target: Target,
        callback: impl FnMut(usize) + 'static,
    ) -> ListenerId {
        self.router.register(target, callback)
    }

    pub fn unregister_trigger_listener(&mut self, id: ListenerId) -> bool {
        self.router.unregister(id)
    }

    pub fn visual_events(&self) -> &[VisualEvent] {
        self.mirror.events()
    }

    pub fn visual_event(&self, index: usize) -> Option<&VisualEvent> {
        self.mirror.event(index)
    }

    /// Renderer hook: fade one slot's pulse by `dt` seconds
    pub fn decay(&mut self, index: usize, dt: f32) {
        self.mirror.decay(index, dt);
    }

    /// Renderer hook: fade every pulse by `dt` seconds
    pub fn decay_all(&mut self, dt: f32) {
        self.mirror.decay_all(dt);
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
