use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod device;
pub mod notes;

// Re-exports
pub use device::{
    num_corners_param, num_events_param, DeviceCommand, DeviceError, DeviceEvent, DeviceTime,
    PARAM_VOLUME,
};

/// One of the two independent voices driving the polygon pair.
///
/// Each target owns its own window over the shared note sequence and its
/// own active mask; the note data itself is shared between both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    A,
    B,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::A, Target::B];

    /// Suffix used in device command tags and parameter names ("A"/"B")
    pub fn suffix(&self) -> &'static str {
        match self {
            Target::A => "A",
            Target::B => "B",
        }
    }

    /// Stable array index for per-target storage
    pub fn index(&self) -> usize {
        match self {
            Target::A => 0,
            Target::B => 1,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One slot of the note sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSlot {
    pub pitch: u8,
    pub velocity: u8,
}

impl NoteSlot {
    pub fn new(pitch: u8, velocity: u8) -> Self {
        Self { pitch, velocity }
    }
}

/// Construction-time shape of the sequencer. The slot count is fixed for
/// the life of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqConfig {
    /// Total note slots (N)
    pub slots: usize,
    /// Smallest window a target may shrink to
    pub min_window: usize,
}

impl Default for SeqConfig {
    fn default() -> Self {
        Self {
            slots: 16,
            min_window: MIN_WINDOW,
        }
    }
}

/// Opaque handle returned by trigger-listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

pub const MIN_WINDOW: usize = 3;
pub const DEFAULT_MASTER_VOLUME: f64 = 0.8;
pub const DEFAULT_NUM_CORNERS: u32 = 5;

/// Default window sizes per target (A shows 8 slots, B shows 5)
pub const DEFAULT_WINDOW_EVENTS: [usize; 2] = [8, 5];

/// The pattern every new session starts from
pub fn default_pattern() -> Vec<NoteSlot> {
    [
        (55, 110),
        (62, 80),
        (60, 100),
        (65, 80),
        (67, 100),
        (70, 80),
        (63, 100),
        (72, 99),
        (60, 100),
        (62, 80),
        (63, 100),
        (65, 80),
        (67, 100),
        (58, 80),
        (60, 100),
        (72, 80),
    ]
    .iter()
    .map(|&(pitch, velocity)| NoteSlot { pitch, velocity })
    .collect()
}
