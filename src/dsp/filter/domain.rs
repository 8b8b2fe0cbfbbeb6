use crate::dsp::{DspError, FrequencySpectrum};

use super::SpectrumFilter;

/// Resample `input` into `output` over the remapped domain
/// `t' = 1 - (1 - t)^(1 / factor)`, linearly interpolating between source
/// bins. A factor of 1 is an exact identity of `t`; factors above 1 stretch
/// the low end of the spectrum across more output bins.
pub(crate) fn domain_shift_resample(input: &[f32], factor: f32, output: &mut [f32]) {
    if output.is_empty() {
        return;
    }
    if input.is_empty() {
        output.fill(0.0);
        return;
    }
    if input.len() == 1 || output.len() == 1 {
        output.fill(input[0]);
        return;
    }

    let in_max = (input.len() - 1) as f32;
    let out_max = (output.len() - 1) as f32;
    let inv_factor = 1.0 / factor;

    for (i, out) in output.iter_mut().enumerate() {
        let t = i as f32 / out_max;
        let shifted = if factor == 1.0 {
            t
        } else {
            1.0 - (1.0 - t).powf(inv_factor)
        };
        let pos = shifted * in_max;
        let lower = pos as usize;
        let upper = (lower + 1).min(input.len() - 1);
        let frac = pos - lower as f32;
        *out = input[lower] + (input[upper] - input[lower]) * frac;
    }
}

/// Pure resampling stage: maps an input spectrum of any size onto a fixed
/// number of output bins with the exponential domain shift. Used when the
/// analyzer's own shift is bypassed or a second remap is chained downstream.
#[derive(Debug)]
pub struct DomainShiftFilter {
    num_bins: usize,
    shift_factor: f32,
    output: FrequencySpectrum,
}

impl DomainShiftFilter {
    pub fn new(num_bins: usize, shift_factor: f32) -> Result<Self, DspError> {
        validate_bins(num_bins)?;
        validate_factor(shift_factor)?;
        Ok(Self {
            num_bins,
            shift_factor,
            output: FrequencySpectrum::new(num_bins),
        })
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn shift_factor(&self) -> f32 {
        self.shift_factor
    }

    pub fn set_num_bins(&mut self, num_bins: usize) -> Result<(), DspError> {
        validate_bins(num_bins)?;
        self.num_bins = num_bins;
        self.output.resize(num_bins);
        Ok(())
    }

    pub fn set_shift_factor(&mut self, shift_factor: f32) -> Result<(), DspError> {
        validate_factor(shift_factor)?;
        self.shift_factor = shift_factor;
        Ok(())
    }
}

impl SpectrumFilter for DomainShiftFilter {
    fn apply(&mut self, input: &FrequencySpectrum) -> &FrequencySpectrum {
        if self.output.len() != self.num_bins {
            self.output.resize(self.num_bins);
        }
        domain_shift_resample(input.bins(), self.shift_factor, self.output.bins_mut());
        &self.output
    }

    fn output(&self) -> &FrequencySpectrum {
        &self.output
    }
}

fn validate_bins(num_bins: usize) -> Result<(), DspError> {
    if num_bins < 2 {
        return Err(DspError::TooFewBins(num_bins));
    }
    Ok(())
}

fn validate_factor(factor: f32) -> Result<(), DspError> {
    if !(factor > 0.0 && factor.is_finite()) {
        return Err(DspError::BadShiftFactor(factor));
    }
    Ok(())
}
