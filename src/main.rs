use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use log::info;

use livespec::{AudioCapture, PipelineSettings, SpectrumPipeline};

/// Live spectrum monitor: captures system audio, runs the analysis
/// pipeline, and logs what a visualizer would draw.
#[derive(Parser)]
#[command(name = "livespec", about = "Live audio spectrum monitor")]
struct Args {
    /// Pipeline settings file (JSON); built-in defaults when omitted
    #[arg(long)]
    settings: Option<PathBuf>,

    /// How long to monitor, in seconds
    #[arg(long, default_value_t = 10)]
    seconds: u64,

    /// Override the analysis frame size from the settings
    #[arg(long)]
    frame_size: Option<usize>,

    /// Write the effective settings out and exit
    #[arg(long)]
    write_settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => PipelineSettings::load(path)?,
        None => PipelineSettings::default(),
    };
    if let Some(frame_size) = args.frame_size {
        settings.frame_size = frame_size;
    }

    if let Some(path) = &args.write_settings {
        settings.save(path)?;
        info!("wrote settings to {:?}", path);
        return Ok(());
    }

    let mut pipeline = SpectrumPipeline::new(&settings)?;
    let capture = AudioCapture::new()?;
    info!(
        "monitoring: {} Hz capture, frame {} / hop {}, {} display bins",
        capture.sample_rate(),
        settings.frame_size,
        settings.frame_gap,
        settings.num_freq_bins
    );

    let started = Instant::now();
    let tick = Duration::from_millis(16);
    let mut total_frames = 0usize;
    let mut ticks = 0u32;

    while started.elapsed() < Duration::from_secs(args.seconds) {
        std::thread::sleep(tick);
        capture.drain_into(&mut pipeline);
        total_frames += pipeline.update();
        ticks += 1;

        // Roughly twice a second
        if ticks % 32 == 0 {
            let spectrum = pipeline.spectrum().bins();
            if let Some((bin, &magnitude)) = spectrum
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
            {
                info!(
                    "peak bin {:>4} magnitude {:.4} ({} frames so far)",
                    bin, magnitude, total_frames
                );
            }
        }
    }

    info!(
        "done: {} frames in {:.1}s ({:.1} frames/s)",
        total_frames,
        started.elapsed().as_secs_f32(),
        total_frames as f32 / started.elapsed().as_secs_f32()
    );
    Ok(())
}
