//! epidemic: CLI for the audio-rate SIR epidemic simulator
//!
//! - `schema`: Print the module schemas as JSON
//! - `render`: Run a clock -> sir patch offline; CSV frames on stdout,
//!   optionally a mono float WAV of one output port
//! - `play`: Wire the patch into the live audio engine

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use epidemic_core::Engine;
use epidemic_core::crossbeam_channel::unbounded;
use epidemic_core::dsp::get_constructors;
use epidemic_core::message::{InputMessage, OutputMessage};
use epidemic_core::patch::Patch;
use epidemic_core::types::{InternalParam, Param, ROOT_ID, Sampleable, SampleableMap};

/// CLI for the audio-rate SIR epidemic simulator
#[derive(Parser)]
#[command(name = "epidemic")]
#[command(about = "Run SIR epidemic patches offline or through the audio engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// The simulator's knobs, shared by `render` and `play`.
#[derive(Args)]
struct Knobs {
    /// Seconds between reseed triggers
    #[arg(long, default_value = "1.0")]
    trigger_interval: f32,

    /// Infected count at each reseed (floored at 1)
    #[arg(long, default_value = "2")]
    initial_infected: f32,

    /// Infection rate (0-0.5)
    #[arg(long, default_value = "0.1")]
    infection_rate: f32,

    /// Recovery rate (0-5)
    #[arg(long, default_value = "1.0")]
    recovery_rate: f32,

    /// Integration time-scale multiplier (0.5-2)
    #[arg(long, default_value = "1.0")]
    time_scale: f32,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the module schemas as JSON
    Schema,

    /// Render a clock -> sir patch offline and emit CSV frames on stdout
    Render {
        #[command(flatten)]
        knobs: Knobs,

        /// Sample rate for the offline run
        #[arg(long, default_value = "48000")]
        sample_rate: u32,

        /// Length of the run in seconds
        #[arg(long, default_value = "8.0")]
        seconds: f32,

        /// Also write a mono 32-bit float WAV of one output port
        #[arg(long)]
        wav: Option<PathBuf>,

        /// Which port the WAV captures
        #[arg(long, default_value = "infected")]
        wav_port: String,
    },

    /// Play a clock -> sir patch through the default audio output
    Play {
        #[command(flatten)]
        knobs: Knobs,

        /// Which sir output to listen to
        #[arg(long, default_value = "infected")]
        listen: String,
    },
}

fn cmd_schema() -> Result<()> {
    let schema = epidemic_core::dsp::schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Build the offline clock -> sir patch with the knobs applied as manual
/// values.
fn build_offline_patch(
    knobs: &Knobs,
    sample_rate: f32,
) -> Result<(Patch, Arc<Box<dyn Sampleable>>)> {
    let constructors = get_constructors();
    let make = |module_type: &str| -> Result<Arc<Box<dyn Sampleable>>> {
        constructors
            .get(module_type)
            .ok_or_else(|| anyhow!("module type {} is not registered", module_type))?(
            module_type,
            sample_rate,
        )
    };

    let clock = make("clock")?;
    clock.update_param(
        "interval",
        &InternalParam::Volts {
            value: knobs.trigger_interval,
        },
    )?;

    let sir = make("sir")?;
    sir.update_param(
        "trigger",
        &InternalParam::Cable {
            module: Arc::downgrade(&clock),
            port: "trigger".to_string(),
        },
    )?;
    for (name, value) in [
        ("initialInfected", knobs.initial_infected),
        ("infectionRate", knobs.infection_rate),
        ("recoveryRate", knobs.recovery_rate),
        ("timeScale", knobs.time_scale),
    ] {
        sir.update_param(name, &InternalParam::Volts { value })?;
    }

    let mut sampleables: SampleableMap = HashMap::new();
    sampleables.insert("clock".to_string(), clock);
    sampleables.insert("sir".to_string(), sir.clone());
    Ok((Patch::new(sampleables), sir))
}

fn cmd_render(
    knobs: &Knobs,
    sample_rate: u32,
    seconds: f32,
    wav: Option<&PathBuf>,
    wav_port: &str,
) -> Result<()> {
    let sr = sample_rate as f32;
    let (patch, sir) = build_offline_patch(knobs, sr)?;

    let mut writer = wav
        .map(|path| {
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 32,
                sample_format: hound::SampleFormat::Float,
            };
            hound::WavWriter::create(path, spec)
                .with_context(|| format!("creating {}", path.display()))
        })
        .transpose()?;

    // One CSV row per visualization frame, matching the module's own
    // history cadence.
    let samples_per_frame = (sr / 60.0).round().max(1.0) as u64;
    let total_samples = (seconds * sr).round() as u64;

    println!("seconds,susceptible,infected,recovered");
    for n in 0..total_samples {
        patch.process_sample();

        if let Some(writer) = writer.as_mut() {
            // Audio follows the engine's convention: 10V CV maps to 1.0.
            writer.write_sample(sir.get_sample(wav_port)? / 10.0)?;
        }

        if (n + 1) % samples_per_frame == 0 {
            println!(
                "{:.4},{:.5},{:.5},{:.5}",
                (n + 1) as f32 / sr,
                sir.get_sample("susceptible")?,
                sir.get_sample("infected")?,
                sir.get_sample("recovered")?,
            );
        }
    }

    if let Some(writer) = writer.take() {
        writer.finalize()?;
    }

    eprintln!(
        "{} {:.1}s at {} Hz; final voltages S={} I={} R={}",
        "rendered".bold(),
        seconds,
        sample_rate,
        format!("{:.3}", sir.get_sample("susceptible")?).cyan(),
        format!("{:.3}", sir.get_sample("infected")?).red(),
        format!("{:.3}", sir.get_sample("recovered")?).green(),
    );
    Ok(())
}

fn cmd_play(knobs: &Knobs, listen: &str) -> Result<()> {
    let (incoming_tx, incoming_rx) = unbounded();
    let (outgoing_tx, outgoing_rx) = unbounded();
    let handle = Engine::spawn(incoming_rx, outgoing_tx);

    for module_type in ["clock", "sir"] {
        incoming_tx.send(InputMessage::CreateModule(module_type.to_string()))?;
    }
    let mut ids: HashMap<String, String> = HashMap::new();
    for _ in 0..2 {
        // A recv error here means the engine thread died before replying,
        // usually for want of an output device.
        match outgoing_rx
            .recv()
            .context("audio engine exited before the patch was built")?
        {
            OutputMessage::CreateModule(module_type, id) => {
                ids.insert(module_type, id);
            }
            _ => return Err(anyhow!("unexpected reply while building the patch")),
        }
    }
    let clock_id = ids.remove("clock").ok_or_else(|| anyhow!("clock was not created"))?;
    let sir_id = ids.remove("sir").ok_or_else(|| anyhow!("sir was not created"))?;

    incoming_tx.send(InputMessage::UpdateParam(
        clock_id.clone(),
        "interval".to_string(),
        Param::Value {
            value: knobs.trigger_interval,
        },
    ))?;
    for (name, value) in [
        ("initialInfected", knobs.initial_infected),
        ("infectionRate", knobs.infection_rate),
        ("recoveryRate", knobs.recovery_rate),
        ("timeScale", knobs.time_scale),
    ] {
        incoming_tx.send(InputMessage::UpdateParam(
            sir_id.clone(),
            name.to_string(),
            Param::Value { value },
        ))?;
    }
    incoming_tx.send(InputMessage::UpdateParam(
        sir_id.clone(),
        "trigger".to_string(),
        Param::Cable {
            module: clock_id,
            port: "trigger".to_string(),
        },
    ))?;
    incoming_tx.send(InputMessage::UpdateParam(
        ROOT_ID.clone(),
        "source".to_string(),
        Param::Cable {
            module: sir_id,
            port: listen.to_string(),
        },
    ))?;

    println!(
        "{} listening to {}; ctrl-c to stop",
        "playing".bold().green(),
        listen.cyan()
    );

    // The engine runs until its message senders drop; holding incoming_tx
    // keeps it alive, so this joins only when the process is killed or the
    // engine fails.
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("audio engine panicked")),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Schema => cmd_schema(),
        Commands::Render {
            knobs,
            sample_rate,
            seconds,
            wav,
            wav_port,
        } => cmd_render(&knobs, sample_rate, seconds, wav.as_ref(), &wav_port),
        Commands::Play { knobs, listen } => cmd_play(&knobs, &listen),
    }
}
