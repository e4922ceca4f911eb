use std::collections::HashMap;

use crate::types::{ModuleSchema, SampleableConstructor};

pub mod core;
pub mod epidemic;
pub mod utilities;
pub mod utils;

pub fn get_constructors() -> HashMap<String, SampleableConstructor> {
    let mut map = HashMap::new();
    core::install_constructors(&mut map);
    utilities::install_constructors(&mut map);
    epidemic::install_constructors(&mut map);
    map
}

pub fn schema() -> Vec<ModuleSchema> {
    [core::schemas(), utilities::schemas(), epidemic::schemas()].concat()
}
