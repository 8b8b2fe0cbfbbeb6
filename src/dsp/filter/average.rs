use crate::dsp::{DspError, FrequencySpectrum};

use super::SpectrumFilter;

/// Temporal smoothing: the unweighted bin-wise mean of the last `depth`
/// input spectra, kept in an instance-owned circular history.
///
/// An input size change zeroes the whole history, so the first `depth`
/// outputs after a resize average against zero-filled slots.
#[derive(Debug)]
pub struct AverageFilter {
    history: Vec<FrequencySpectrum>,
    cursor: usize,
    output: FrequencySpectrum,
}

impl AverageFilter {
    pub fn new(depth: usize) -> Result<Self, DspError> {
        if depth == 0 {
            return Err(DspError::ZeroHistoryDepth);
        }
        Ok(Self {
            history: vec![FrequencySpectrum::default(); depth],
            cursor: 0,
            output: FrequencySpectrum::default(),
        })
    }

    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Change the averaging depth. Discards all history and resets the
    /// cursor; the next few outputs are averaged against zeroed slots.
    pub fn set_depth(&mut self, depth: usize) -> Result<(), DspError> {
        if depth == 0 {
            return Err(DspError::ZeroHistoryDepth);
        }
        let size = self.output.len();
        self.history = vec![FrequencySpectrum::new(size); depth];
        self.cursor = 0;
        Ok(())
    }
}

impl SpectrumFilter for AverageFilter {
    fn apply(&mut self, input: &FrequencySpectrum) -> &FrequencySpectrum {
        let size = input.len();
        if self.history[0].len() != size {
            for slot in &mut self.history {
                slot.resize(size);
            }
        }
        self.history[self.cursor].copy_from(input.bins());
        self.cursor = (self.cursor + 1) % self.history.len();

        if self.output.len() != size {
            self.output.resize(size);
        }
        let scale = 1.0 / self.history.len() as f32;
        let out = self.output.bins_mut();
        out.fill(0.0);
        for slot in &self.history {
            for (acc, &bin) in out.iter_mut().zip(slot.bins()) {
                *acc += bin;
            }
        }
        for acc in out.iter_mut() {
            *acc *= scale;
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

    fn constant_spectrum(size: usize, value: f32) -> FrequencySpectrum {
        let mut s = FrequencySpectrum::new(size);
        s.bins_mut().fill(value);
        s
    }

    #[test]
    fn test_zero_depth_rejected() {
        assert!(AverageFilter::new(0).is_err());
        let mut filter = AverageFilter::new(4).unwrap();
        assert!(filter.set_depth(0).is_err());
        assert_eq!(filter.depth(), 4);
    }

    #[test]
    fn test_converges_to_constant_input() {
        let depth = 6;
        let mut filter = AverageFilter::new(depth).unwrap();
        let input = constant_spectrum(10, 0.8);

        for _ in 0..depth {
            filter.apply(&input);
        }
        for &bin in filter.output().bins() {
            assert!((bin - 0.8).abs() < 1e-6);
        }
    }

    #[test]
    fn test_partial_history_averages_against_zeros() {
        let mut filter = AverageFilter::new(4).unwrap();
        let out = filter.apply(&constant_spectrum(5, 1.0));
        for &bin in out.bins() {
            assert!((bin - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_resize_discards_history() {
        let mut filter = AverageFilter::new(2).unwrap();
        filter.apply(&constant_spectrum(8, 1.0));
        filter.apply(&constant_spectrum(8, 1.0));

        // A new input size zeroes every slot before the write
        let out = filter.apply(&constant_spectrum(4, 1.0));
        assert_eq!(out.len(), 4);
        for &bin in out.bins() {
            assert!((bin - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_set_depth_resets_history() {
        let mut filter = AverageFilter::new(2).unwrap();
        filter.apply(&constant_spectrum(3, 1.0));
        filter.set_depth(2).unwrap();
        let out = filter.apply(&constant_spectrum(3, 1.0));
        for &bin in out.bins() {
            assert!((bin - 0.5).abs() < 1e-6);
        }
    }
}
