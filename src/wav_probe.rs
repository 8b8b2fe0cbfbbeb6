use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use livespec::{PipelineSettings, SpectrumPipeline};

/// Offline probe: streams a WAV file through the spectrum pipeline at file
/// rate and writes a JSON report of spectrum snapshots.
#[derive(Parser)]
#[command(name = "wav-probe", about = "Offline spectrum probe for WAV files")]
struct Args {
    /// Input WAV file
    input: PathBuf,

    /// Pipeline settings file (JSON); built-in defaults when omitted
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Report destination; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Spectrum snapshots per second of audio
    #[arg(long, default_value_t = 10)]
    snapshot_rate: u32,
}

#[derive(Serialize)]
struct ProbeReport {
    input: String,
    sample_rate: u32,
    duration_secs: f32,
    frames_processed: usize,
    snapshots: Vec<Snapshot>,
}

#[derive(Serialize)]
struct Snapshot {
    time_secs: f32,
    peak_bin: usize,
    peak_magnitude: f32,
    spectrum: Vec<f32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => PipelineSettings::load(path)?,
        None => PipelineSettings::default(),
    };
    if args.snapshot_rate == 0 {
        bail!("snapshot rate must be at least 1");
    }

    let (samples, sample_rate) = read_mono_samples(&args.input)?;
    let duration_secs = samples.len() as f32 / sample_rate as f32;
    info!(
        "loaded {:?}: {} mono samples at {} Hz ({:.1}s)",
        args.input,
        samples.len(),
        sample_rate,
        duration_secs
    );

    let mut pipeline = SpectrumPipeline::new(&settings)?;
    let snapshot_every = (sample_rate / args.snapshot_rate).max(1) as usize;

    let mut report = ProbeReport {
        input: args.input.display().to_string(),
        sample_rate,
        duration_secs,
        frames_processed: 0,
        snapshots: Vec::new(),
    };

    let mut since_snapshot = 0usize;
    let mut consumed = 0usize;
    for chunk in samples.chunks(settings.frame_gap) {
        pipeline.push_samples(chunk);
        report.frames_processed += pipeline.update();
        consumed += chunk.len();
        since_snapshot += chunk.len();

        if since_snapshot >= snapshot_every {
            since_snapshot -= snapshot_every;
            let spectrum = pipeline.spectrum().bins();
            if let Some((peak_bin, &peak_magnitude)) = spectrum
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
            {
                report.snapshots.push(Snapshot {
                    time_secs: consumed as f32 / sample_rate as f32,
                    peak_bin,
                    peak_magnitude,
                    spectrum: spectrum.to_vec(),
                });
            }
        }
    }

    info!(
        "probe complete: {} frames, {} snapshots",
        report.frames_processed,
        report.snapshots.len()
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create report at {:?}", path))?;
            serde_json::to_writer_pretty(BufWriter::new(file), &report)?;
        }
        None => {
            let json = serde_json::to_string_pretty(&report)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Decode a WAV file to mono f32, averaging interleaved channels.
fn read_mono_samples(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("failed to open {:?}", path))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        bail!("{:?} declares zero channels", path);
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("failed to decode float samples")?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .context("failed to decode integer samples")?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}
