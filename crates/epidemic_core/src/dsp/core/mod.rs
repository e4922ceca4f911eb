use std::collections::HashMap;

use crate::types::{Module, ModuleSchema, SampleableConstructor};

pub mod signal;

pub fn install_constructors(map: &mut HashMap<String, SampleableConstructor>) {
    signal::Signal::install_constructor(map);
}

pub fn schemas() -> Vec<ModuleSchema> {
    vec![signal::Signal::get_schema()]
}
