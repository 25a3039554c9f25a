use serde::{Deserialize, Serialize};

/// Snapshot of one target's window: the contiguous sub-range
/// `[start_index, start_index + num_events)` of the note sequence.
///
/// Index conversion is done against a snapshot taken when an event is
/// received, not re-derived later, so a window move between receipt and
/// dispatch cannot shift the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowState {
    pub start_index: usize,
    pub num_events: usize,
}

impl WindowState {
    /// One past the last absolute index covered
    pub fn end(&self) -> usize {
        self.start_index + self.num_events
    }

    pub fn contains(&self, absolute: usize) -> bool {
        absolute >= self.start_index && absolute < self.end()
    }

    pub fn to_absolute(&self, relative: usize) -> usize {
        self.start_index + relative
    }

    /// Window-relative position of an absolute index, None outside the window
    pub fn to_relative(&self, absolute: usize) -> Option<usize> {
        if self.contains(absolute) {
            Some(absolute - self.start_index)
        } else {
            None
        }
    }

    /// Absolute indices covered by this window
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start_index..self.end()
    }
}

/// Owns one target's window position and size, keeping both inside the
/// fixed N-slot sequence. Requests outside the legal bounds are clamped,
/// never rejected; setters return the value actually applied.
pub struct WindowManager {
    slots: usize,
    min_window: usize,
    state: WindowState,
}

impl WindowManager {
    pub fn new(slots: usize, min_window: usize, num_events: usize) -> Self {
        let mut wm = Self {
            slots,
            min_window: min_window.min(slots),
            state: WindowState {
                start_index: 0,
                num_events: slots,
            },
        };
        wm.set_num_events(num_events);
        wm
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn start_index(&self) -> usize {
        self.state.start_index
    }

    pub fn num_events(&self) -> usize {
        self.state.num_events
    }

    /// Resize the window. Clamps to `[min_window, slots]`; if the new size
    /// would run past the end of the sequence from the current start, the
    /// start is pulled back to `slots - n`. The window never grows past
    /// the end. Returns the applied size.
    pub fn set_num_events(&mut self, n: usize) -> usize {
        let n = n.clamp(self.min_window, self.slots);
        self.state.num_events = n;
        if self.state.end() > self.slots {
            self.state.start_index = self.slots - n;
        }
        n
    }

    /// Reposition the window. Clamps to `[0, slots - num_events]`.
    /// Returns the applied start index.
    pub fn set_start_index(&mut self, start: usize) -> usize {
        let max_start = self.slots - self.state.num_events;
        self.state.start_index = start.min(max_start);
        self.state.start_index
    }
}
