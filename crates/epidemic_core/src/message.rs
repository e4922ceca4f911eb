use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use crossbeam_channel::Sender;
use parking_lot::Mutex;

use crate::{
    patch::Patch,
    types::{ModuleSchema, ModuleState, Param, SampleableConstructor},
};

pub enum InputMessage {
    Echo(String),
    Schema,
    GetModules,
    GetModule(String),
    CreateModule(String),
    UpdateParam(String, String, Param),
}

pub enum OutputMessage {
    Echo(String),
    Schema(Vec<ModuleSchema>),
    PatchState(Vec<ModuleState>),
    ModuleState(String, Option<ModuleState>),
    CreateModule(String, String),
}

pub fn handle_message(
    message: InputMessage,
    patch: &Arc<Mutex<Patch>>,
    constructors: &HashMap<String, SampleableConstructor>,
    sample_rate: f32,
    sender: &Sender<OutputMessage>,
) -> anyhow::Result<()> {
    match message {
        InputMessage::Echo(s) => sender.send(OutputMessage::Echo(format!("{}!", s)))?,
        InputMessage::Schema => sender.send(OutputMessage::Schema(crate::dsp::schema()))?,
        InputMessage::GetModules => {
            sender.send(OutputMessage::PatchState(patch.lock().get_state()))?;
        }
        InputMessage::GetModule(id) => {
            let state = patch
                .lock()
                .sampleables
                .get(&id)
                .map(|module| module.get_state());
            sender.send(OutputMessage::ModuleState(id, state))?;
        }
        InputMessage::CreateModule(module_type) => {
            let constructor = constructors
                .get(&module_type)
                .ok_or_else(|| anyhow!("module type {} does not exist", module_type))?;
            let id = uuid::Uuid::new_v4().to_string();
            let module = constructor(&id, sample_rate)?;
            patch.lock().sampleables.insert(id.clone(), module);
            sender.send(OutputMessage::CreateModule(module_type, id))?;
        }
        InputMessage::UpdateParam(id, param_name, param) => {
            let patch = patch.lock();
            let internal = param.to_internal_param(&patch);
            match patch.sampleables.get(&id) {
                Some(module) => module.update_param(&param_name, &internal)?,
                None => return Err(anyhow!("no module with id {}", id)),
            }
        }
    };
    Ok(())
}
