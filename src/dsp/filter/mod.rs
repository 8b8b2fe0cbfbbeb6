pub mod amplitude;
pub mod average;
pub mod domain;
pub mod peak;

pub use amplitude::AmplitudeFilter;
pub use average::AverageFilter;
pub use domain::DomainShiftFilter;
pub use peak::PeakFilter;

use crate::dsp::FrequencySpectrum;

/// A composable spectrum post-processing stage.
///
/// Each filter owns exactly one output buffer and overwrites it on every
/// call; the output resizes itself to the stage's natural size. The chain
/// used by the live pipeline is amplitude -> domain shift -> peak ->
/// average, so the amplitude curve operates on raw FFT bins before any
/// spatial resampling.
pub trait SpectrumFilter {
    /// Transform `input` into this filter's output buffer and return it.
    ///
    /// The borrow stays valid until the next `apply` on the same instance.
    fn apply(&mut self, input: &FrequencySpectrum) -> &FrequencySpectrum;

    /// The most recent output, without reprocessing.
    fn output(&self) -> &FrequencySpectrum;
}
