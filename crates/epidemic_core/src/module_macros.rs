//! Boilerplate generators for DSP modules.
//!
//! `module_params!` implements the `Params` trait for a module's param
//! struct; `sampleable_module!` wraps a module in a thread-safe
//! `Sampleable` (locked outputs, lazily forced update) and registers its
//! constructor and schema. Module structs are expected to carry `params`
//! and `outputs` fields named exactly that.

macro_rules! module_params {
    (
        $params:ident {
            $($field:ident => ($name:literal, $desc:literal)),+ $(,)?
        }
    ) => {
        impl $crate::types::Params for $params {
            fn get_params_state(
                &self,
            ) -> std::collections::HashMap<String, $crate::types::Param> {
                let mut state = std::collections::HashMap::new();
                $(
                    state.insert($name.to_owned(), self.$field.to_param());
                )+
                state
            }

            fn update_param(
                &mut self,
                param_name: &str,
                new_param: &$crate::types::InternalParam,
                module_name: &str,
            ) -> anyhow::Result<()> {
                match param_name {
                    $(
                        $name => {
                            if self.$field != *new_param {
                                self.$field = new_param.clone();
                            }
                            Ok(())
                        }
                    )+
                    _ => Err(anyhow::anyhow!(
                        "{} is not a valid param name for {}",
                        param_name,
                        module_name
                    )),
                }
            }

            fn get_schema() -> &'static [$crate::types::PortSchema] {
                &[
                    $(
                        $crate::types::PortSchema {
                            name: $name,
                            description: $desc,
                        },
                    )+
                ]
            }
        }
    };
}

macro_rules! sampleable_module {
    (
        $module:ident, $params:ident, $type_name:literal, $description:literal,
        outputs: {
            $($field:ident => ($port:literal, $port_desc:literal)),+ $(,)?
        }
    ) => {
        paste::paste! {
            #[derive(Default)]
            pub struct [<$module Outputs>] {
                $(pub $field: f32,)+
            }

            #[derive(Default)]
            struct [<$module Sampleable>] {
                id: String,
                sample_rate: f32,
                outputs: parking_lot::RwLock<[<$module Outputs>]>,
                module: parking_lot::Mutex<$module>,
                processed: ::core::sync::atomic::AtomicBool,
            }

            impl $crate::types::Sampleable for [<$module Sampleable>] {
                fn get_id(&self) -> &String {
                    &self.id
                }

                fn tick(&self) -> () {
                    self.processed
                        .store(false, ::core::sync::atomic::Ordering::Release);
                }

                fn update(&self) -> () {
                    if let Ok(_) = self.processed.compare_exchange(
                        false,
                        true,
                        ::core::sync::atomic::Ordering::Acquire,
                        ::core::sync::atomic::Ordering::Relaxed,
                    ) {
                        let mut module = self.module.lock();
                        module.update(self.sample_rate);
                        let mut outputs = self
                            .outputs
                            .try_write_for(::core::time::Duration::from_millis(10))
                            .unwrap();
                        $(
                            outputs.$field = module.outputs.$field;
                        )+
                    }
                }

                fn get_sample(&self, port: &str) -> anyhow::Result<f32> {
                    self.update();
                    match port {
                        $(
                            $port => Ok(self
                                .outputs
                                .try_read_for(::core::time::Duration::from_millis(10))
                                .unwrap()
                                .$field),
                        )+
                        _ => Err(anyhow::anyhow!(
                            "{} with id {} does not have port {}",
                            $type_name,
                            self.id,
                            port
                        )),
                    }
                }

                fn get_state(&self) -> $crate::types::ModuleState {
                    use $crate::types::Params;
                    $crate::types::ModuleState {
                        module_type: $type_name.to_owned(),
                        id: self.id.clone(),
                        params: self.module.lock().params.get_params_state(),
                    }
                }

                fn update_param(
                    &self,
                    param_name: &str,
                    new_param: &$crate::types::InternalParam,
                ) -> anyhow::Result<()> {
                    use $crate::types::Params;
                    self.module
                        .lock()
                        .params
                        .update_param(param_name, new_param, $type_name)
                }
            }

            fn [<$module:snake _constructor>](
                id: &str,
                sample_rate: f32,
            ) -> anyhow::Result<std::sync::Arc<Box<dyn $crate::types::Sampleable>>> {
                Ok(std::sync::Arc::new(Box::new([<$module Sampleable>] {
                    id: id.into(),
                    sample_rate,
                    ..Default::default()
                })))
            }

            impl $crate::types::Module for $module {
                fn install_constructor(
                    map: &mut std::collections::HashMap<
                        String,
                        $crate::types::SampleableConstructor,
                    >,
                ) {
                    map.insert($type_name.into(), Box::new([<$module:snake _constructor>]));
                }

                fn get_schema() -> $crate::types::ModuleSchema {
                    use $crate::types::Params;
                    $crate::types::ModuleSchema {
                        name: $type_name,
                        description: $description,
                        params: <$params as Params>::get_schema(),
                        outputs: &[
                            $(
                                $crate::types::PortSchema {
                                    name: $port,
                                    description: $port_desc,
                                },
                            )+
                        ],
                    }
                }
            }
        }
    };
}
