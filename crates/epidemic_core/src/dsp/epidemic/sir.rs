//! SIR (Susceptible-Infected-Recovered) epidemic simulator, run at audio
//! rate as a CV source.
//!
//! Each sample advances the ODE system by one fixed-size explicit Euler
//! step. This is deliberately the cheapest possible scheme: first-order
//! accuracy is traded for per-sample cost, and nothing prevents negative
//! or runaway populations inside the integrator. Outputs are only
//! saturated at the final voltage mapping.

use crate::{
    dsp::utils::{SchmittTrigger, clamp, trigger_input},
    types::InternalParam,
};

use super::history::{HistoryRing, HistorySample};

/// Simulated-time step per audio sample.
pub const DT: f32 = 0.0001;

/// S + I + R at reseed; initial susceptible is the remainder after the
/// infected count.
pub const TOTAL_POPULATION: f32 = 100.0;

const DEFAULT_INITIAL_INFECTED: f32 = 2.0;
const DEFAULT_INFECTION_RATE: f32 = 0.1;
const DEFAULT_RECOVERY_RATE: f32 = 1.0;
const DEFAULT_TIME_SCALE: f32 = 1.0;

/// History recording cadence target, decoupled from the audio rate.
const TARGET_FRAME_RATE: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirState {
    pub susceptible: f32,
    pub infected: f32,
    pub recovered: f32,
}

impl SirState {
    pub fn seeded(initial_infected: i32) -> Self {
        let infected = initial_infected as f32;
        Self {
            susceptible: TOTAL_POPULATION - infected,
            infected,
            recovered: 0.0,
        }
    }

    pub fn total(&self) -> f32 {
        self.susceptible + self.infected + self.recovered
    }
}

impl Default for SirState {
    fn default() -> Self {
        Self::seeded(DEFAULT_INITIAL_INFECTED as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub infection: f32,
    pub recovery: f32,
    pub k: f32,
}

/// One explicit Euler step. dS + dI + dR is zero analytically, so the
/// population total is conserved up to f32 rounding.
pub fn euler_step(state: SirState, rates: Rates, dt: f32) -> SirState {
    let ds = -rates.infection * state.susceptible * state.infected;
    let di = rates.infection * state.susceptible * state.infected - rates.recovery * state.infected;
    let dr = rates.recovery * state.infected;
    SirState {
        susceptible: state.susceptible + ds * dt * rates.k,
        infected: state.infected + di * dt * rates.k,
        recovered: state.recovered + dr * dt * rates.k,
    }
}

/// Population count to output voltage: a pure saturating scale.
pub fn population_to_voltage(value: f32) -> f32 {
    clamp(0.0, 10.0, value / 10.0)
}

/// Unifies the two historical variants of this module: one plotted its
/// history and integrated forever, the other had no plot but froze once
/// elapsed time passed a ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirConfig {
    pub history_enabled: bool,
    pub integration_ceiling: Option<f32>,
    /// When true, a cable on the timeScale param overrides the manual
    /// value; when false the manual value is read unconditionally.
    pub time_scale_cv: bool,
}

impl Default for SirConfig {
    fn default() -> Self {
        Self {
            history_enabled: true,
            integration_ceiling: None,
            time_scale_cv: false,
        }
    }
}

#[derive(Default)]
pub struct SirParams {
    trigger: InternalParam,
    initial_infected: InternalParam,
    infection_rate: InternalParam,
    recovery_rate: InternalParam,
    time_scale: InternalParam,
}

module_params! {
    SirParams {
        trigger => ("trigger", "external clock input; a rising edge reseeds the run"),
        initial_infected => ("initialInfected", "infected count at reseed, floored at 1 (default 2)"),
        infection_rate => ("infectionRate", "infection rate; cable voltage is divided by 20 (0-0.5)"),
        recovery_rate => ("recoveryRate", "recovery rate; cable voltage is divided by 2 (0-5)"),
        time_scale => ("timeScale", "integration time-scale multiplier (0.5-2)"),
    }
}

pub struct Sir {
    outputs: SirOutputs,
    params: SirParams,
    config: SirConfig,
    state: SirState,
    t: f32,
    trigger: SchmittTrigger,
    history: HistoryRing,
    samples_per_frame: u32,
    sample_counter: u32,
    last_sample_rate: f32,
}

sampleable_module! {
    Sir, SirParams, "sir", "An audio-rate SIR epidemic simulator; S, I and R population counts as CV",
    outputs: {
        susceptible => ("susceptible", "susceptible population as 0-10V CV"),
        infected => ("infected", "infected population as 0-10V CV"),
        recovered => ("recovered", "recovered population as 0-10V CV"),
    }
}

impl Default for Sir {
    fn default() -> Self {
        Self::with_config(SirConfig::default())
    }
}

impl Sir {
    pub fn with_config(config: SirConfig) -> Self {
        Self {
            outputs: SirOutputs::default(),
            params: SirParams::default(),
            config,
            state: SirState::default(),
            t: 0.0,
            trigger: trigger_input(),
            history: HistoryRing::default(),
            samples_per_frame: 0,
            sample_counter: 0,
            // Forces a cadence computation on the first processed sample.
            last_sample_rate: 0.0,
        }
    }

    pub fn set_param(&mut self, param_name: &str, param: InternalParam) -> anyhow::Result<()> {
        use crate::types::Params;
        self.params.update_param(param_name, &param, "sir")
    }

    pub fn state(&self) -> SirState {
        self.state
    }

    pub fn elapsed(&self) -> f32 {
        self.t
    }

    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    pub fn samples_per_frame(&self) -> u32 {
        self.samples_per_frame
    }

    pub fn outputs(&self) -> (f32, f32, f32) {
        (
            self.outputs.susceptible,
            self.outputs.infected,
            self.outputs.recovered,
        )
    }

    pub fn update(&mut self, sample_rate: f32) {
        // Without a clock cable the module is fully idle: no integration,
        // no reseeding, no output updates.
        if !self.params.trigger.is_connected() {
            return;
        }

        if sample_rate != self.last_sample_rate {
            self.samples_per_frame = (sample_rate / TARGET_FRAME_RATE).round() as u32;
            self.last_sample_rate = sample_rate;
        }

        if self.trigger.process(self.params.trigger.get_value()) {
            self.reseed();
        }

        if let Some(ceiling) = self.config.integration_ceiling {
            if self.t > ceiling {
                // Frozen until the next trigger edge.
                return;
            }
        }

        let rates = self.resolve_rates();
        self.state = euler_step(self.state, rates, DT);
        self.t += DT;

        if self.config.history_enabled {
            self.sample_counter += 1;
            if self.sample_counter >= self.samples_per_frame {
                self.history.record(HistorySample {
                    t: self.t,
                    susceptible: self.state.susceptible,
                    infected: self.state.infected,
                    recovered: self.state.recovered,
                });
                self.sample_counter = 0;
            }
        }

        self.outputs.susceptible = population_to_voltage(self.state.susceptible);
        self.outputs.infected = population_to_voltage(self.state.infected);
        self.outputs.recovered = population_to_voltage(self.state.recovered);
    }

    fn reseed(&mut self) {
        let requested = self
            .params
            .initial_infected
            .get_value_or(DEFAULT_INITIAL_INFECTED);
        let initial_infected = (requested.round() as i32).max(1);

        self.state = SirState::seeded(initial_infected);
        self.t = 0.0;
        if self.config.history_enabled {
            self.history.clear();
            self.sample_counter = 0;
        }
    }

    fn resolve_rates(&self) -> Rates {
        let infection = if self.params.infection_rate.is_connected() {
            self.params.infection_rate.get_value() / 20.0
        } else {
            self.params
                .infection_rate
                .get_value_or(DEFAULT_INFECTION_RATE)
        };

        let recovery = if self.params.recovery_rate.is_connected() {
            self.params.recovery_rate.get_value() / 2.0
        } else {
            self.params.recovery_rate.get_value_or(DEFAULT_RECOVERY_RATE)
        };

        let k = if self.params.time_scale.is_connected() {
            if self.config.time_scale_cv {
                self.params.time_scale.get_value()
            } else {
                DEFAULT_TIME_SCALE
            }
        } else {
            self.params.time_scale.get_value_or(DEFAULT_TIME_SCALE)
        };

        Rates {
            infection: clamp(0.0, 0.5, infection),
            recovery: clamp(0.0, 5.0, recovery),
            k: clamp(0.5, 2.0, k),
        }
    }
}
