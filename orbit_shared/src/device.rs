use serde::{Deserialize, Serialize};

use crate::Target;

/// Commands sent from the sequencer core to the audio device.
///
/// On the wire each command is a tag plus a positional numeric payload;
/// the device does not see these enum variants, only `tag()`/`payload()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceCommand {
    /// Overwrite a note slot. Always addressed by absolute index.
    UpdateNote {
        index: usize,
        pitch: u8,
        velocity: u8,
    },
    /// Set the active flag for a step inside a target's current window.
    /// Addressed by window-relative index.
    UpdateActive {
        target: Target,
        relative_index: usize,
        active: bool,
    },
    /// Reposition a target's window
    StartIndex { target: Target, start_index: usize },
}

impl DeviceCommand {
    pub fn tag(&self) -> &'static str {
        match self {
            DeviceCommand::UpdateNote { .. } => "update_note",
            DeviceCommand::UpdateActive { target, .. } => match target {
                Target::A => "update_active_A",
                Target::B => "update_active_B",
            },
            DeviceCommand::StartIndex { target, .. } => match target {
                Target::A => "start_index_A",
                Target::B => "start_index_B",
            },
        }
    }

    pub fn payload(&self) -> Vec<f64> {
        match *self {
            DeviceCommand::UpdateNote {
                index,
                pitch,
                velocity,
            } => vec![index as f64, pitch as f64, velocity as f64],
            DeviceCommand::UpdateActive {
                relative_index,
                active,
                ..
            } => vec![relative_index as f64, if active { 1.0 } else { 0.0 }],
            DeviceCommand::StartIndex { start_index, .. } => vec![start_index as f64],
        }
    }
}

/// Logical timestamp for command scheduling. Everything this core sends
/// is immediate, but the device contract requires a time slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DeviceTime {
    Now,
    Millis(f64),
}

/// An asynchronous event emitted by the device: a tag plus a positional
/// numeric payload. Only the trigger tags are core state; everything else
/// (angle telemetry and friends) is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub tag: String,
    pub payload: Vec<f64>,
}

impl DeviceEvent {
    pub fn new(tag: impl Into<String>, payload: Vec<f64>) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }

    /// A step-fired event for one target, window-relative index
    pub fn trigger(target: Target, relative_index: usize) -> Self {
        let tag = match target {
            Target::A => "trigger_A",
            Target::B => "trigger_B",
        };
        Self::new(tag, vec![relative_index as f64])
    }

    /// Shape-rotation telemetry (radians)
    pub fn angle(radians: f64) -> Self {
        Self::new("angle", vec![radians])
    }

    /// Parse this event as a trigger, if it is one
    pub fn as_trigger(&self) -> Option<(Target, usize)> {
        let target = match self.tag.as_str() {
            "trigger_A" => Target::A,
            "trigger_B" => Target::B,
            _ => return None,
        };
        let relative = *self.payload.first()?;
        if relative < 0.0 {
            return None;
        }
        Some((target, relative as usize))
    }
}

/// Error type for device operations
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("device is not available")]
    Unavailable,

    #[error("failed to schedule {tag}: {reason}")]
    SendFailed { tag: String, reason: String },

    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
}

/// Name of the window-size parameter for a target ("numEvents_A"/"numEvents_B")
pub fn num_events_param(target: Target) -> &'static str {
    match target {
        Target::A => "numEvents_A",
        Target::B => "numEvents_B",
    }
}

/// Name of the cosmetic corner-count parameter for a target
pub fn num_corners_param(target: Target) -> &'static str {
    match target {
        Target::A => "numCorners_A",
        Target::B => "numCorners_B",
    }
}

pub const PARAM_VOLUME: &str = "volume";
