//! cpal-backed audio engine: one patch sample per output frame, with the
//! root module's CV written to every channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::dsp;
use crate::message::{self, InputMessage, OutputMessage};
use crate::patch::Patch;
use crate::types::{ROOT_ID, SampleableMap};

/// Outputs follow the 0-10V CV convention; scale down before handing the
/// signal to the soundcard.
const OUTPUT_ATTENUATION: f32 = 10.0;

pub struct Engine;

impl Engine {
    pub fn spawn(
        incoming_rx: Receiver<InputMessage>,
        outgoing_tx: Sender<OutputMessage>,
    ) -> JoinHandle<Result<()>> {
        thread::spawn(move || {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| anyhow!("no audio output device found"))?;
            let config = device.default_output_config()?;

            match config.sample_format() {
                cpal::SampleFormat::I8 => run::<i8>(&device, config.into(), incoming_rx, outgoing_tx),
                cpal::SampleFormat::I16 => {
                    run::<i16>(&device, config.into(), incoming_rx, outgoing_tx)
                }
                cpal::SampleFormat::I32 => {
                    run::<i32>(&device, config.into(), incoming_rx, outgoing_tx)
                }
                cpal::SampleFormat::F32 => {
                    run::<f32>(&device, config.into(), incoming_rx, outgoing_tx)
                }
                format => Err(anyhow!("unsupported sample format: {:?}", format)),
            }
        })
    }
}

fn run<T>(
    device: &cpal::Device,
    config: cpal::StreamConfig,
    incoming_rx: Receiver<InputMessage>,
    outgoing_tx: Sender<OutputMessage>,
) -> Result<()>
where
    T: SizedSample + FromSample<f32>,
{
    let sample_rate = config.sample_rate as f32;
    let channels = config.channels as usize;
    tracing::info!("audio output: {} Hz, {} channels", sample_rate, channels);

    let constructors = dsp::get_constructors();
    let root_constructor = constructors
        .get("signal")
        .ok_or_else(|| anyhow!("signal module is not registered"))?;
    let root = root_constructor(&ROOT_ID, sample_rate)?;

    let mut sampleables: SampleableMap = HashMap::new();
    sampleables.insert(ROOT_ID.clone(), root);
    let patch = Arc::new(Mutex::new(Patch::new(sampleables)));

    let stream_patch = patch.clone();
    let err_fn = |err| tracing::error!("output stream error: {}", err);
    let stream = device.build_output_stream(
        &config,
        move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
            write_output(output, channels, &stream_patch);
        },
        err_fn,
        None,
    )?;
    stream.play()?;

    // Message loop; runs until every sender is dropped.
    for message in incoming_rx.iter() {
        if let Err(e) =
            message::handle_message(message, &patch, &constructors, sample_rate, &outgoing_tx)
        {
            tracing::warn!("message handling failed: {}", e);
        }
    }
    Ok(())
}

fn write_output<T>(output: &mut [T], channels: usize, patch: &Arc<Mutex<Patch>>)
where
    T: SizedSample + FromSample<f32>,
{
    // Never block the audio thread on the patch lock.
    let Some(patch) = patch.try_lock() else {
        output.fill(T::from_sample(0.0));
        return;
    };
    for frame in output.chunks_mut(channels) {
        patch.process_sample();
        let value = T::from_sample(patch.get_output() / OUTPUT_ATTENUATION);
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}
