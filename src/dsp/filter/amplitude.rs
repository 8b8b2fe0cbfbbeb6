use crate::dsp::{CurveTable, FrequencySpectrum};

use super::SpectrumFilter;

/// Per-bin remap through a curve table.
///
/// The lookup is a nearest-neighbor table read with the input clamped to
/// [0, 1]; the curve is never interpolated, unlike the domain-shift
/// resampler.
#[derive(Debug)]
pub struct AmplitudeFilter {
    curve: CurveTable,
    output: FrequencySpectrum,
}

impl AmplitudeFilter {
    pub fn new(curve: CurveTable) -> Self {
        Self {
            curve,
            output: FrequencySpectrum::default(),
        }
    }

    /// Replace the curve wholesale.
    pub fn set_curve(&mut self, curve: CurveTable) {
        self.curve = curve;
    }

    pub fn curve(&self) -> &CurveTable {
        &self.curve
    }
}

impl SpectrumFilter for AmplitudeFilter {
    fn apply(&mut self, input: &FrequencySpectrum) -> &FrequencySpectrum {
        if self.output.len() != input.len() {
            self.output.resize(input.len());
        }
        for (out, &magnitude) in self.output.bins_mut().iter_mut().zip(input.bins()) {
            *out = self.curve.lookup(magnitude);
        }
        &self.output
    }

    fn output(&self) -> &FrequencySpectrum {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_curve_round_trip() {
        // A linear identity curve reproduces the input up to the
        // nearest-neighbor quantization of the table.
        let size = 1024;
        let curve = CurveTable::linear(size).unwrap();
        let mut filter = AmplitudeFilter::new(curve);

        let mut input = FrequencySpectrum::new(64);
        for (i, bin) in input.bins_mut().iter_mut().enumerate() {
            *bin = i as f32 / 63.0;
        }

        let out = filter.apply(&input);
        let quantum = 1.0 / (size - 1) as f32;
        for (o, i) in out.bins().iter().zip(input.bins()) {
            assert!((o - i).abs() <= quantum, "{o} vs {i}");
        }
    }

    #[test]
    fn test_out_of_range_input_clamped() {
        let curve = CurveTable::from_samples(vec![0.25, 0.5, 0.75]).unwrap();
        let mut filter = AmplitudeFilter::new(curve);

        let mut input = FrequencySpectrum::new(2);
        input.bins_mut().copy_from_slice(&[-1.0, 7.5]);
        let out = filter.apply(&input);
        assert_eq!(out.bins(), &[0.25, 0.75]);
    }

    #[test]
    fn test_output_tracks_input_size() {
        let curve = CurveTable::linear(16).unwrap();
        let mut filter = AmplitudeFilter::new(curve);
        assert_eq!(filter.apply(&FrequencySpectrum::new(8)).len(), 8);
        assert_eq!(filter.apply(&FrequencySpectrum::new(32)).len(), 32);
    }
}
