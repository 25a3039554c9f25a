use orbit_shared::{default_pattern, NoteSlot};

/// Error type for slot access outside `[0, N)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("index {index} out of range (sequence holds {len} slots)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Canonical ordered buffer of note slots. Length is fixed at
/// construction; slots are only ever overwritten, never added or removed.
pub struct NoteStore {
    slots: Vec<NoteSlot>,
}

impl NoteStore {
    pub fn new(slots: Vec<NoteSlot>) -> Self {
        Self { slots }
    }

    /// A store of `len` slots seeded from the default pattern, cycling it
    /// when `len` exceeds the pattern length.
    pub fn with_default_pattern(len: usize) -> Self {
        let pattern = default_pattern();
        let slots = (0..len).map(|i| pattern[i % pattern.len()]).collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<NoteSlot, CoreError> {
        self.slots
            .get(index)
            .copied()
            .ok_or(CoreError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            })
    }

    pub fn set(&mut self, index: usize, slot: NoteSlot) -> Result<(), CoreError> {
        let len = self.slots.len();
        match self.slots.get_mut(index) {
            Some(existing) => {
                *existing = slot;
                Ok(())
            }
            None => Err(CoreError::IndexOutOfRange { index, len }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, NoteSlot)> + '_ {
        self.slots.iter().copied().enumerate()
    }
}

/// Per-target boolean activity over the same index space as the notes
pub struct ActiveMask {
    flags: Vec<bool>,
}

impl ActiveMask {
    pub fn new(len: usize, initial: bool) -> Self {
        Self {
            flags: vec![initial; len],
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<bool, CoreError> {
        self.flags
            .get(index)
            .copied()
            .ok_or(CoreError::IndexOutOfRange {
                index,
                len: self.flags.len(),
            })
    }

    pub fn set(&mut self, index: usize, active: bool) -> Result<(), CoreError> {
        let len = self.flags.len();
        match self.flags.get_mut(index) {
            Some(flag) => {
                *flag = active;
                Ok(())
            }
            None => Err(CoreError::IndexOutOfRange { index, len }),
        }
    }

    pub fn toggle(&mut self, index: usize) -> Result<bool, CoreError> {
        let current = self.get(index)?;
        self.set(index, !current)?;
        Ok(!current)
    }
}
