//! Integration tests for the SIR module, driven through the public
//! constructor registry with real cables.

use epidemic_core::dsp::epidemic::sir::{DT, Sir, SirConfig, SirState};
use epidemic_core::dsp::get_constructors;
use epidemic_core::patch::Patch;
use epidemic_core::types::{InternalParam, Sampleable, SampleableMap};
use std::collections::HashMap;
use std::sync::Arc;

const SAMPLE_RATE: f32 = 48000.0;

/// Create a named module from the constructor registry.
fn make_module(module_type: &str, id: &str) -> Arc<Box<dyn Sampleable>> {
    let constructors = get_constructors();
    constructors
        .get(module_type)
        .unwrap_or_else(|| panic!("no constructor for '{module_type}'"))(id, SAMPLE_RATE)
        .unwrap_or_else(|e| panic!("constructor for '{module_type}' failed: {e}"))
}

fn cable_to(source: &Arc<Box<dyn Sampleable>>, port: &str) -> InternalParam {
    InternalParam::Cable {
        module: Arc::downgrade(source),
        port: port.to_string(),
    }
}

fn volts(value: f32) -> InternalParam {
    InternalParam::Volts { value }
}

/// A patch with a `signal` module (id "gate") cabled into a `sir` module
/// (id "sir-1") as its trigger source.
fn gated_sir_patch() -> (Patch, Arc<Box<dyn Sampleable>>, Arc<Box<dyn Sampleable>>) {
    let gate = make_module("signal", "gate");
    let sir = make_module("sir", "sir-1");

    gate.update_param("source", &volts(0.0)).unwrap();
    sir.update_param("trigger", &cable_to(&gate, "output"))
        .unwrap();

    let mut sampleables: SampleableMap = HashMap::new();
    sampleables.insert("gate".to_string(), gate.clone());
    sampleables.insert("sir-1".to_string(), sir.clone());
    (Patch::new(sampleables), gate, sir)
}

fn read_populations(sir: &Arc<Box<dyn Sampleable>>) -> (f32, f32, f32) {
    // Outputs are population / 10 volts; scale back up for assertions.
    (
        sir.get_sample("susceptible").unwrap() * 10.0,
        sir.get_sample("infected").unwrap() * 10.0,
        sir.get_sample("recovered").unwrap() * 10.0,
    )
}

fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol
}

#[test]
fn first_step_matches_default_scenario() {
    let (patch, _gate, sir) = gated_sir_patch();

    patch.process_sample();

    // One Euler step from (98, 2, 0) with the default knob values.
    let (s, i, r) = read_populations(&sir);
    assert!(approx_eq(s, 97.99804, 1e-3), "susceptible was {s}");
    assert!(approx_eq(i, 2.00176, 1e-3), "infected was {i}");
    assert!(approx_eq(r, 0.0002, 1e-4), "recovered was {r}");
}

#[test]
fn trigger_edge_reseeds_from_initial_infected() {
    let (patch, gate, sir) = gated_sir_patch();
    sir.update_param("initialInfected", &volts(5.0)).unwrap();

    // A few samples with the gate low.
    for _ in 0..10 {
        patch.process_sample();
    }

    // Rising edge: reseed to (95, 5, 0), then the same sample integrates.
    gate.update_param("source", &volts(5.0)).unwrap();
    patch.process_sample();

    let (s, i, _) = read_populations(&sir);
    let expected_s = 95.0 - 0.1 * 95.0 * 5.0 * DT;
    let expected_i = 5.0 + (0.1 * 95.0 * 5.0 - 1.0 * 5.0) * DT;
    assert!(approx_eq(s, expected_s, 1e-3), "susceptible was {s}");
    assert!(approx_eq(i, expected_i, 1e-3), "infected was {i}");
}

#[test]
fn requested_zero_infected_is_floored_to_one() {
    let (patch, gate, sir) = gated_sir_patch();
    sir.update_param("initialInfected", &volts(-3.0)).unwrap();

    gate.update_param("source", &volts(5.0)).unwrap();
    patch.process_sample();

    let (s, i, _) = read_populations(&sir);
    // Reseeded to (99, 1, 0), then one step.
    assert!(approx_eq(s, 98.99901, 1e-3), "susceptible was {s}");
    assert!(approx_eq(i, 1.00089, 1e-3), "infected was {i}");
}

#[test]
fn held_high_gate_does_not_retrigger() {
    let (patch, gate, sir) = gated_sir_patch();

    gate.update_param("source", &volts(5.0)).unwrap();
    for _ in 0..100 {
        patch.process_sample();
    }

    // Only the first sample's edge reseeded; the run then advanced 100
    // steps without interruption.
    let (_, i, r) = read_populations(&sir);
    assert!(i > 2.0, "infected should have grown past the seed, was {i}");
    assert!(r > 0.0, "recovered should have accumulated, was {r}");
}

#[test]
fn no_clock_cable_means_fully_idle() {
    let sir = make_module("sir", "sir-1");
    sir.update_param("trigger", &volts(5.0)).unwrap();

    let mut sampleables: SampleableMap = HashMap::new();
    sampleables.insert("sir-1".to_string(), sir.clone());
    let patch = Patch::new(sampleables);

    for _ in 0..1000 {
        patch.process_sample();
    }
    assert_eq!(read_populations(&sir), (0.0, 0.0, 0.0));
}

#[test]
fn cv_inputs_override_manual_rates() {
    let (mut patch, _gate, sir) = gated_sir_patch();
    // 4V on the infection-rate input reads as 4/20 = 0.2.
    let cv = make_module("signal", "cv");
    cv.update_param("source", &volts(4.0)).unwrap();
    sir.update_param("infectionRate", &cable_to(&cv, "output"))
        .unwrap();
    patch.sampleables.insert("cv".to_string(), cv);

    patch.process_sample();
    let (s, _, _) = read_populations(&sir);
    let expected_s = 98.0 - 0.2 * 98.0 * 2.0 * DT;
    assert!(approx_eq(s, expected_s, 1e-3), "susceptible was {s}");
}

// ─── Raw-module tests for config-dependent behavior ──────────────────────────

/// Drive a raw `Sir` with a registry `signal` module as its clock source.
fn raw_sir_with_gate(config: SirConfig) -> (Sir, Arc<Box<dyn Sampleable>>) {
    let gate = make_module("signal", "gate");
    gate.update_param("source", &volts(0.0)).unwrap();

    let mut sir = Sir::with_config(config);
    sir.set_param("trigger", cable_to(&gate, "output")).unwrap();
    (sir, gate)
}

/// One sample: refresh the gate, then the simulator.
fn step(sir: &mut Sir, gate: &Arc<Box<dyn Sampleable>>, sample_rate: f32) {
    gate.tick();
    sir.update(sample_rate);
}

#[test]
fn ceiling_freezes_run_until_next_trigger() {
    let config = SirConfig {
        history_enabled: false,
        integration_ceiling: Some(0.005),
        time_scale_cv: false,
    };
    let (mut sir, gate) = raw_sir_with_gate(config);

    for _ in 0..300 {
        step(&mut sir, &gate, SAMPLE_RATE);
    }
    // 300 steps would reach t = 0.03; the ceiling stops the run just past
    // 0.005.
    assert!(sir.elapsed() > 0.0049 && sir.elapsed() < 0.0053);
    let frozen = sir.state();

    for _ in 0..100 {
        step(&mut sir, &gate, SAMPLE_RATE);
    }
    assert_eq!(sir.state(), frozen);

    // A new edge reseeds and the integration resumes.
    gate.update_param("source", &volts(5.0)).unwrap();
    step(&mut sir, &gate, SAMPLE_RATE);
    assert!(approx_eq(sir.elapsed(), DT, 1e-6));
    assert!(sir.state() != frozen);
}

#[test]
fn sample_rate_change_recomputes_cadence_without_reset() {
    let (mut sir, gate) = raw_sir_with_gate(SirConfig::default());

    step(&mut sir, &gate, 44100.0);
    assert_eq!(sir.samples_per_frame(), 735);

    step(&mut sir, &gate, 48000.0);
    assert_eq!(sir.samples_per_frame(), 800);

    // Two steps happened; elapsed time and state were not disturbed.
    assert!(approx_eq(sir.elapsed(), 2.0 * DT, 1e-6));
    assert!(sir.state() != SirState::default());
}

#[test]
fn history_records_at_frame_cadence_newest_first() {
    // 600 Hz with a 60 Hz target frame rate records every 10th sample.
    let (mut sir, gate) = raw_sir_with_gate(SirConfig::default());

    for _ in 0..600 {
        step(&mut sir, &gate, 600.0);
    }

    let ts: Vec<f32> = sir.history().iter_recent().map(|s| s.t).collect();
    assert_eq!(ts.len(), 31);
    assert!(approx_eq(ts[0], 600.0 * DT, 1e-5), "newest t was {}", ts[0]);
    for pair in ts.windows(2) {
        assert!(
            approx_eq(pair[0] - pair[1], 10.0 * DT, 1e-5),
            "expected one record per frame, got spacing {}",
            pair[0] - pair[1]
        );
    }
}

#[test]
fn trigger_edge_clears_history() {
    let (mut sir, gate) = raw_sir_with_gate(SirConfig::default());

    for _ in 0..600 {
        step(&mut sir, &gate, 600.0);
    }
    assert!(sir.history().iter_recent().any(|s| s.t > 0.0));

    gate.update_param("source", &volts(5.0)).unwrap();
    step(&mut sir, &gate, 600.0);

    // The reseed wiped the ring; one post-reseed step is not enough to
    // reach the next recording cadence.
    assert!(sir.history().iter_recent().all(|s| s.t == 0.0));
    assert!(approx_eq(sir.elapsed(), DT, 1e-6));
}

#[test]
fn time_scale_cv_policy_controls_cable_override() {
    let cv = make_module("signal", "cv");
    cv.update_param("source", &volts(2.0)).unwrap();

    // Policy off: the cable is ignored and k stays at the default 1.0.
    let (mut reference, gate) = raw_sir_with_gate(SirConfig::default());
    reference
        .set_param("timeScale", cable_to(&cv, "output"))
        .unwrap();
    step(&mut reference, &gate, SAMPLE_RATE);

    let (mut overridden, gate2) = raw_sir_with_gate(SirConfig {
        time_scale_cv: true,
        ..SirConfig::default()
    });
    overridden
        .set_param("timeScale", cable_to(&cv, "output"))
        .unwrap();
    cv.tick();
    step(&mut overridden, &gate2, SAMPLE_RATE);

    // Same cable on both; only the CV policy differs. k = 2 doubles the
    // first step's displacement.
    let moved_ref = 98.0 - reference.state().susceptible;
    let moved_cv = 98.0 - overridden.state().susceptible;
    assert!(moved_cv > moved_ref * 1.5, "cv {moved_cv} vs ref {moved_ref}");
}
