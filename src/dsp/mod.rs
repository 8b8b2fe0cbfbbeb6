pub mod analyzer;
pub mod curve;
pub mod error;
pub mod filter;
pub mod spectrum;

pub use analyzer::SpectrumAnalyzer;
pub use curve::CurveTable;
pub use error::DspError;
pub use filter::{AmplitudeFilter, AverageFilter, DomainShiftFilter, PeakFilter, SpectrumFilter};
pub use spectrum::FrequencySpectrum;
