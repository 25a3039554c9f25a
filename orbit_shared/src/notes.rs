//! Pitch display names for the step markers.

const NOTE_NAMES: [&str; 12] = [
    "C", "C♯", "D", "D♯", "E", "F", "F♯", "G", "G♯", "A", "A♯", "B",
];

/// Display name for a MIDI pitch, C-2 convention (pitch 60 = C3).
/// Pitch 0 is the rest marker.
pub fn note_name(pitch: u8) -> String {
    if pitch == 0 {
        return "✖︎".to_string();
    }
    let name = NOTE_NAMES[(pitch % 12) as usize];
    let octave = (pitch / 12) as i32 - 2;
    format!("{}{}", name, octave)
}
