use std::collections::HashMap;

use crate::types::{Module, ModuleSchema, SampleableConstructor};

pub mod history;
pub mod sir;

pub fn install_constructors(map: &mut HashMap<String, SampleableConstructor>) {
    sir::Sir::install_constructor(map);
}

pub fn schemas() -> Vec<ModuleSchema> {
    vec![sir::Sir::get_schema()]
}
