use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};

use super::pipeline::SpectrumPipeline;

/// Live audio capture feeding the spectrum pipeline.
///
/// Prefers the system loopback (the default output device, where the
/// backend can capture it) and falls back to the default input device.
/// Interleaved frames are downmixed to mono inside the stream callback and
/// handed to the consumer thread over an unbounded channel; `drain_into`
/// polls that channel without blocking.
pub struct AudioCapture {
    _stream: Stream,
    receiver: Receiver<Vec<f32>>,
    sample_rate: u32,
    channels: u16,
}

impl AudioCapture {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device =
            pick_loopback_device(&host).context("no suitable audio capture device found")?;
        let config = device
            .default_input_config()
            .or_else(|_| device.default_output_config())
            .context("capture device advertises no usable format")?;

        info!(
            "capturing from '{}' ({} ch @ {} Hz)",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.channels(),
            config.sample_rate().0
        );

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();
        let (sender, receiver) = crossbeam_channel::unbounded();

        let stream = build_input_stream(&device, &config.into(), channels as usize, sender)?;
        stream.play().context("failed to start capture stream")?;

        Ok(Self {
            _stream: stream,
            receiver,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Absorb everything the capture thread delivered since the last call.
    /// Returns the number of mono samples pushed into the pipeline.
    pub fn drain_into(&self, pipeline: &mut SpectrumPipeline) -> usize {
        let mut absorbed = 0;
        while let Ok(chunk) = self.receiver.try_recv() {
            absorbed += pipeline.push_samples(&chunk);
        }
        absorbed
    }
}

fn pick_loopback_device(host: &cpal::Host) -> Option<Device> {
    host.default_output_device()
        .or_else(|| host.default_input_device())
}

fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    channels: usize,
    sender: Sender<Vec<f32>>,
) -> Result<Stream> {
    let stream = device.build_input_stream(
        config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let mono: Vec<f32> = if channels <= 1 {
                data.to_vec()
            } else {
                data.chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                    .collect()
            };
            if sender.send(mono).is_err() {
                warn!("spectrum consumer dropped its receiver");
            }
        },
        |err| {
            warn!("audio stream error: {err}");
        },
        None,
    )?;

    Ok(stream)
}
