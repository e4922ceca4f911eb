//! Core patch structure for DSP processing
//!
//! A `Patch` is the graph of connected modules. Processing is two-phase:
//! `tick` marks every module unprocessed, then `update` forces each one;
//! cables pull their source through `get_sample`, which updates lazily,
//! so evaluation order never depends on map iteration order.

use crate::types::{ModuleState, ROOT_ID, ROOT_OUTPUT_PORT, SampleableMap};

pub struct Patch {
    pub sampleables: SampleableMap,
}

impl Patch {
    pub fn new(sampleables: SampleableMap) -> Self {
        Patch { sampleables }
    }

    /// Advance the whole graph by one sample.
    pub fn process_sample(&self) {
        for (_, module) in self.sampleables.iter() {
            module.tick();
        }
        for (_, module) in self.sampleables.iter() {
            module.update();
        }
    }

    pub fn get_state(&self) -> Vec<ModuleState> {
        self.sampleables
            .iter()
            .map(|(_, module)| module.get_state())
            .collect()
    }

    /// The root module's output sample, or silence when there is no root.
    pub fn get_output(&self) -> f32 {
        match self.sampleables.get(&*ROOT_ID) {
            Some(root) => root.get_sample(&ROOT_OUTPUT_PORT).unwrap_or(0.0),
            None => 0.0,
        }
    }
}
