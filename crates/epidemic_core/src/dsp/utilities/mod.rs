use std::collections::HashMap;

use crate::types::{Module, ModuleSchema, SampleableConstructor};

pub mod clock;

pub fn install_constructors(map: &mut HashMap<String, SampleableConstructor>) {
    clock::PulseClock::install_constructor(map);
}

pub fn schemas() -> Vec<ModuleSchema> {
    vec![clock::PulseClock::get_schema()]
}
