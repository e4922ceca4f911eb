//! Fixed-capacity history of simulation samples for plotting.
//!
//! The ring is a plain array plus a wrapping write cursor; no allocation
//! ever happens, so recording is safe on the audio path. Readers never do
//! index arithmetic themselves: `iter_recent` is the only read surface.

pub const HISTORY_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistorySample {
    pub t: f32,
    pub susceptible: f32,
    pub infected: f32,
    pub recovered: f32,
}

#[derive(Debug, Clone)]
pub struct HistoryRing {
    slots: [HistorySample; HISTORY_CAPACITY],
    cursor: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self {
            slots: [HistorySample::default(); HISTORY_CAPACITY],
            cursor: 0,
        }
    }
}

impl HistoryRing {
    pub fn record(&mut self, sample: HistorySample) {
        self.slots[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % HISTORY_CAPACITY;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Walk from the newest sample backward, wrapping, for capacity - 1
    /// entries. The slot at the cursor is the next write target and is
    /// never yielded.
    pub fn iter_recent(&self) -> impl Iterator<Item = &HistorySample> + '_ {
        (1..HISTORY_CAPACITY)
            .map(move |age| &self.slots[(self.cursor + HISTORY_CAPACITY - age) % HISTORY_CAPACITY])
    }
}
