#[macro_use]
extern crate lazy_static;

#[macro_use]
mod module_macros;

pub mod dsp;
pub mod engine;
pub mod message;
pub mod patch;
pub mod types;

pub use crossbeam_channel;
pub use engine::Engine;
pub use uuid;
