//! Real-time audio spectrum analysis for visualizer front-ends.
//!
//! Raw loopback audio goes in one end and a stable, visually shaped
//! frequency spectrum comes out the other:
//!
//! audio source -> [`FrameRingBuffer`] -> [`SpectrumAnalyzer`] (FFT) ->
//! amplitude -> domain shift -> peak hold -> average -> consumer
//!
//! [`SpectrumPipeline`] wires the whole chain together and decouples the
//! audio hop rate from the render tick rate; the `dsp` module exposes the
//! individual stages for custom chains.

pub mod audio;
pub mod config;
pub mod dsp;

pub use audio::{AudioCapture, FrameRingBuffer, SpectrumPipeline};
pub use config::PipelineSettings;
pub use dsp::{
    AmplitudeFilter, AverageFilter, CurveTable, DomainShiftFilter, DspError, FrequencySpectrum,
    PeakFilter, SpectrumAnalyzer, SpectrumFilter,
};
