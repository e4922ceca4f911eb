pub fn clamp<T: std::cmp::PartialOrd>(min: T, max: T, val: T) -> T {
    if val < min {
        min
    } else if val > max {
        max
    } else {
        val
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchmittState {
    Low,
    High,
}

/// Hysteresis edge detector for clock-like signals. Fires when the input
/// crosses above the high threshold having previously been below the low
/// threshold. The first processed sample only establishes state, so a
/// signal that is already high when the cable is patched does not fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchmittTrigger {
    state: Option<SchmittState>,
    low_threshold: f32,
    high_threshold: f32,
}

impl SchmittTrigger {
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            state: None,
            low_threshold,
            high_threshold,
        }
    }

    /// Process one sample. Returns true on a low-to-high transition.
    pub fn process(&mut self, input: f32) -> bool {
        match self.state {
            None => {
                self.state = Some(if input >= self.high_threshold {
                    SchmittState::High
                } else {
                    SchmittState::Low
                });
                false
            }
            Some(SchmittState::High) => {
                if input < self.low_threshold {
                    self.state = Some(SchmittState::Low);
                }
                false
            }
            Some(SchmittState::Low) => {
                if input > self.high_threshold {
                    self.state = Some(SchmittState::High);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn is_high(&self) -> bool {
        self.state == Some(SchmittState::High)
    }

    pub fn reset(&mut self) {
        self.state = None;
    }
}

/// Thresholds matching the usual trigger-input convention: rearm below
/// 0.1 V, fire above 1 V.
pub fn trigger_input() -> SchmittTrigger {
    SchmittTrigger::new(0.1, 1.0)
}
