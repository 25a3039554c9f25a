use serde::Serialize;

/// Pulse fade rate in energy units per second. Matches a 0.02-per-frame
/// fade at a nominal 60 fps renderer.
pub const PULSE_DECAY_PER_SEC: f32 = 1.2;

/// Per-slot view consumed by the renderer: pitch, combined activity and
/// the transient trigger pulse.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VisualEvent {
    pub index: usize,
    pub pitch: u8,
    /// OR over both targets' active masks
    pub active: bool,
    pub triggered: bool,
    /// 1.0 at trigger, fades to 0.0
    pub pulse_energy: f32,
}

/// Fixed arena of visual events, one record per absolute slot index.
///
/// Records are mutated in place and never reallocated, so animation state
/// riding on a slot (the fading pulse) survives every note or activity
/// update without flicker.
pub struct VisualMirror {
    events: Vec<VisualEvent>,
}

impl VisualMirror {
    pub fn new(len: usize) -> Self {
        let events = (0..len)
            .map(|index| VisualEvent {
                index,
                pitch: 0,
                active: false,
                triggered: false,
                pulse_energy: 0.0,
            })
            .collect();
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[VisualEvent] {
        &self.events
    }

    pub fn event(&self, index: usize) -> Option<&VisualEvent> {
        self.events.get(index)
    }

    pub fn set_pitch(&mut self, index: usize, pitch: u8) {
        if let Some(ev) = self.events.get_mut(index) {
            ev.pitch = pitch;
        }
    }

    /// Update the combined (OR-over-targets) activity for one slot.
    /// Deactivating does not cut a pulse short; it just fades out.
    pub fn set_active(&mut self, index: usize, active: bool) {
        if let Some(ev) = self.events.get_mut(index) {
            ev.active = active;
        }
    }

    /// Start a pulse at `index`. Only active slots pulse; returns whether
    /// one was started.
    pub fn trigger(&mut self, index: usize) -> bool {
        match self.events.get_mut(index) {
            Some(ev) if ev.active => {
                ev.triggered = true;
                ev.pulse_energy = 1.0;
                true
            }
            _ => false,
        }
    }

    /// Fade the pulse at `index` by `dt` seconds. Energy only ever
    /// decreases here; at zero the triggered flag clears.
    pub fn decay(&mut self, index: usize, dt: f32) {
        if let Some(ev) = self.events.get_mut(index) {
            if !ev.triggered {
                return;
            }
            ev.pulse_energy = (ev.pulse_energy - dt.max(0.0) * PULSE_DECAY_PER_SEC).max(0.0);
            if ev.pulse_energy <= 0.0 {
                ev.triggered = false;
            }
        }
    }

    /// Per-frame fade over the whole arena
    pub fn decay_all(&mut self, dt: f32) {
        for index in 0..self.events.len() {
            self.decay(index, dt);
        }
    }
}
