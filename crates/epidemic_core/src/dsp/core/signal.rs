use crate::types::InternalParam;

#[derive(Default)]
pub struct SignalParams {
    source: InternalParam,
}

module_params! {
    SignalParams {
        source => ("source", "signal input"),
    }
}

/// Passthrough of its source param; the patch root is one of these.
#[derive(Default)]
pub struct Signal {
    outputs: SignalOutputs,
    params: SignalParams,
}

sampleable_module! {
    Signal, SignalParams, "signal", "a signal",
    outputs: {
        output => ("output", "signal output"),
    }
}

impl Signal {
    fn update(&mut self, _sample_rate: f32) -> () {
        self.outputs.output = self.params.source.get_value();
    }
}
