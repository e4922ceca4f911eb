use crate::{dsp::utils::clamp, types::InternalParam};

#[derive(Default)]
pub struct PulseClockParams {
    interval: InternalParam,
    run: InternalParam,
}

module_params! {
    PulseClockParams {
        interval => ("interval", "seconds between pulses (0.01-60, default 1)"),
        run => ("run", "run gate (>2.5V = running, defaults high)"),
    }
}

/// Internal trigger source: emits a one-sample 5V pulse every interval.
#[derive(Default)]
pub struct PulseClock {
    outputs: PulseClockOutputs,
    params: PulseClockParams,
    phase: f32,
}

sampleable_module! {
    PulseClock, PulseClockParams, "clock", "A pulse clock for triggering other modules",
    outputs: {
        trigger => ("trigger", "5V pulse every interval"),
        ramp => ("ramp", "0 to 5V ramp over one interval"),
    }
}

impl PulseClock {
    fn update(&mut self, sample_rate: f32) {
        // Gate defaults high so an unpatched clock free-runs.
        let is_running = self.params.run.get_value_or(5.0) > 2.5;

        let interval = clamp(0.01, 60.0, self.params.interval.get_value_or(1.0));
        let phase_increment = 1.0 / (interval * sample_rate);

        let mut fired = false;
        if is_running {
            self.phase += phase_increment;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
                fired = true;
            }
        }

        self.outputs.trigger = if fired { 5.0 } else { 0.0 };
        self.outputs.ramp = self.phase * 5.0;
    }
}
