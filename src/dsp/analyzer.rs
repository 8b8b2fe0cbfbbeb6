use std::sync::Arc;

use log::debug;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::filter::domain::domain_shift_resample;
use super::filter::peak;
use super::{CurveTable, DspError, FrequencySpectrum};

/// Turns fixed-size time-domain frames into an averaged magnitude spectrum.
///
/// The caller fills `frame_input_mut()` with exactly `frame_size` samples
/// and calls `process_frame()`. Each frame is FFT'd, normalized, optionally
/// remapped through an amplitude curve, domain-shifted down to
/// `num_freq_bins` output bins, optionally peak-smoothed, and written into a
/// circular history; `spectrum()` is the unweighted mean over that history.
///
/// Everything runs on the caller's thread. Configuration setters reallocate
/// the buffers they affect and must not race `process_frame()`.
pub struct SpectrumAnalyzer {
    frame_size: usize,
    num_freq_bins: usize,
    num_spectrums: usize,
    domain_shift_factor: f32,

    planner: FftPlanner<f32>,
    fft: Arc<dyn Fft<f32>>,
    frame_input: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,

    amplitude_curve: Option<CurveTable>,
    peak_curve: Option<CurveTable>,
    peak_tmp: Vec<f32>,

    history: Vec<FrequencySpectrum>,
    cursor: usize,
    final_spectrum: FrequencySpectrum,
}

impl SpectrumAnalyzer {
    pub fn new(frame_size: usize, num_freq_bins: usize) -> Result<Self, DspError> {
        validate_frame_size(frame_size)?;
        validate_bins(num_freq_bins)?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);

        Ok(Self {
            frame_size,
            num_freq_bins,
            num_spectrums: 1,
            domain_shift_factor: 1.0,
            planner,
            fft,
            frame_input: vec![0.0; frame_size],
            scratch: vec![Complex::new(0.0, 0.0); frame_size],
            magnitudes: vec![0.0; frame_size / 2 + 1],
            amplitude_curve: None,
            peak_curve: None,
            peak_tmp: Vec::new(),
            history: vec![FrequencySpectrum::new(num_freq_bins)],
            cursor: 0,
            final_spectrum: FrequencySpectrum::new(num_freq_bins),
        })
    }

    /// Time-domain input buffer for the caller to fill with `frame_size`
    /// samples before `process_frame()`.
    pub fn frame_input_mut(&mut self) -> &mut [f32] {
        &mut self.frame_input
    }

    /// The most recently analyzed time-domain frame.
    pub fn frame_input(&self) -> &[f32] {
        &self.frame_input
    }

    /// The averaged output spectrum, valid until the next `process_frame()`.
    pub fn spectrum(&self) -> &FrequencySpectrum {
        &self.final_spectrum
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn num_freq_bins(&self) -> usize {
        self.num_freq_bins
    }

    pub fn num_spectrums(&self) -> usize {
        self.num_spectrums
    }

    pub fn domain_shift_factor(&self) -> f32 {
        self.domain_shift_factor
    }

    /// Natural magnitude count of one FFT frame, before domain shifting.
    pub fn natural_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Analyze the current contents of the frame input buffer.
    pub fn process_frame(&mut self) {
        let out_size = self.frame_size / 2 + 1;

        for (slot, &sample) in self.scratch.iter_mut().zip(&self.frame_input) {
            *slot = Complex::new(sample, 0.0);
        }
        self.fft.process(&mut self.scratch);

        // Real input: only the non-negative frequency half carries
        // information. Normalizing by the FFT length puts a full-scale
        // sine of amplitude A at A/2 in its bin.
        let norm = 1.0 / self.frame_size as f32;
        for (magnitude, bin) in self.magnitudes[..out_size]
            .iter_mut()
            .zip(&self.scratch[..out_size])
        {
            *magnitude = bin.norm() * norm;
        }

        if let Some(curve) = &self.amplitude_curve {
            for magnitude in &mut self.magnitudes[..out_size] {
                *magnitude = curve.lookup(*magnitude);
            }
        }

        let cursor = self.cursor;
        domain_shift_resample(
            &self.magnitudes[..out_size],
            self.domain_shift_factor,
            self.history[cursor].bins_mut(),
        );

        if let Some(curve) = &self.peak_curve {
            peak::smooth_in_place(self.history[cursor].bins_mut(), curve, &mut self.peak_tmp);
        }

        self.cursor = (self.cursor + 1) % self.num_spectrums;

        let scale = 1.0 / self.num_spectrums as f32;
        let out = self.final_spectrum.bins_mut();
        out.fill(0.0);
        for slot in &self.history {
            for (acc, &bin) in out.iter_mut().zip(slot.bins()) {
                *acc += bin;
            }
        }
        for acc in out.iter_mut() {
            *acc *= scale;
        }
    }

    /// Change the FFT frame length. Re-plans the FFT and reallocates every
    /// time-domain and scratch buffer (zeroed); resets the history cursor.
    pub fn set_frame_size(&mut self, frame_size: usize) -> Result<(), DspError> {
        validate_frame_size(frame_size)?;
        debug!("analyzer frame size {} -> {}", self.frame_size, frame_size);
        self.frame_size = frame_size;
        self.fft = self.planner.plan_fft_forward(frame_size);
        self.frame_input = vec![0.0; frame_size];
        self.scratch = vec![Complex::new(0.0, 0.0); frame_size];
        self.magnitudes = vec![0.0; frame_size / 2 + 1];
        self.cursor = 0;
        Ok(())
    }

    /// Change the output bin count. Reallocates the history and the final
    /// spectrum (zeroed) and resets the cursor.
    pub fn set_num_freq_bins(&mut self, num_freq_bins: usize) -> Result<(), DspError> {
        validate_bins(num_freq_bins)?;
        self.num_freq_bins = num_freq_bins;
        self.history = vec![FrequencySpectrum::new(num_freq_bins); self.num_spectrums];
        self.final_spectrum = FrequencySpectrum::new(num_freq_bins);
        self.cursor = 0;
        Ok(())
    }

    /// Change the averaging history depth. Discards all history.
    pub fn set_num_spectrums(&mut self, num_spectrums: usize) -> Result<(), DspError> {
        if num_spectrums == 0 {
            return Err(DspError::ZeroHistoryDepth);
        }
        self.num_spectrums = num_spectrums;
        self.history = vec![FrequencySpectrum::new(self.num_freq_bins); num_spectrums];
        self.final_spectrum.clear();
        self.cursor = 0;
        Ok(())
    }

    pub fn set_domain_shift_factor(&mut self, factor: f32) -> Result<(), DspError> {
        if !(factor > 0.0 && factor.is_finite()) {
            return Err(DspError::BadShiftFactor(factor));
        }
        self.domain_shift_factor = factor;
        Ok(())
    }

    /// Install or replace the amplitude remap curve (replaced wholesale).
    pub fn set_amplitude_curve(&mut self, curve: CurveTable) {
        self.amplitude_curve = Some(curve);
    }

    pub fn clear_amplitude_curve(&mut self) {
        self.amplitude_curve = None;
    }

    /// Install or replace the peak-decay curve (replaced wholesale).
    pub fn set_peak_curve(&mut self, curve: CurveTable) {
        self.peak_curve = Some(curve);
    }

    pub fn clear_peak_curve(&mut self) {
        self.peak_curve = None;
    }
}

fn validate_frame_size(frame_size: usize) -> Result<(), DspError> {
    if frame_size == 0 {
        return Err(DspError::ZeroFrameSize);
    }
    Ok(())
}

fn validate_bins(num_freq_bins: usize) -> Result<(), DspError> {
    if num_freq_bins < 2 {
        return Err(DspError::TooFewBins(num_freq_bins));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_sine(frame: &mut [f32], bin: usize, amplitude: f32) {
        let n = frame.len() as f32;
        for (i, sample) in frame.iter_mut().enumerate() {
            let phase = 2.0 * std::f32::consts::PI * bin as f32 * i as f32 / n;
            *sample = amplitude * phase.sin();
        }
    }

    #[test]
    fn test_sine_peaks_at_half_amplitude() {
        let frame_size = 1024;
        let mut analyzer = SpectrumAnalyzer::new(frame_size, frame_size / 2 + 1).unwrap();
        fill_sine(analyzer.frame_input_mut(), 64, 0.8);
        analyzer.process_frame();

        let spectrum = analyzer.spectrum().bins();
        let (peak_bin, &peak) = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert_eq!(peak_bin, 64);
        assert!((peak - 0.4).abs() < 1e-3, "peak magnitude {peak}");

        // Energy is confined to that bin for an exact-bin sine
        assert!(spectrum[32] < 1e-3);
        assert!(spectrum[128] < 1e-3);
    }

    #[test]
    fn test_domain_shift_factor_one_is_identity() {
        // With the natural bin count and factor 1, the analyzer output is
        // the raw normalized magnitude spectrum, computed independently
        // here with the same FFT engine.
        let frame_size = 256;
        let natural = frame_size / 2 + 1;

        let mut analyzer = SpectrumAnalyzer::new(frame_size, natural).unwrap();
        analyzer.set_domain_shift_factor(1.0).unwrap();
        fill_sine(analyzer.frame_input_mut(), 10, 0.5);

        let mut expected: Vec<Complex<f32>> = analyzer
            .frame_input()
            .iter()
            .map(|&s| Complex::new(s, 0.0))
            .collect();
        FftPlanner::new()
            .plan_fft_forward(frame_size)
            .process(&mut expected);

        analyzer.process_frame();
        for (bin, raw) in analyzer.spectrum().bins().iter().zip(&expected) {
            let magnitude = raw.norm() / frame_size as f32;
            assert!((bin - magnitude).abs() < 1e-6, "{bin} vs {magnitude}");
        }
    }

    #[test]
    fn test_history_average_over_identical_frames() {
        let mut analyzer = SpectrumAnalyzer::new(512, 64).unwrap();
        analyzer.set_num_spectrums(4).unwrap();
        analyzer.set_domain_shift_factor(2.0).unwrap();

        fill_sine(analyzer.frame_input_mut(), 8, 1.0);
        analyzer.process_frame();
        let first = analyzer.spectrum().bins().to_vec();

        // Same frame again: history fills with identical spectra, so the
        // mean scales linearly with the fill count.
        fill_sine(analyzer.frame_input_mut(), 8, 1.0);
        analyzer.process_frame();
        let second = analyzer.spectrum().bins().to_vec();
        for (a, b) in first.iter().zip(&second) {
            assert!((b - 2.0 * a).abs() < 1e-5);
        }

        for _ in 0..2 {
            fill_sine(analyzer.frame_input_mut(), 8, 1.0);
            analyzer.process_frame();
        }
        // History full: steady state equals one frame's spectrum
        let steady = analyzer.spectrum().bins().to_vec();
        for (a, b) in first.iter().zip(&steady) {
            assert!((b - 4.0 * a).abs() < 1e-5);
        }
    }

    #[test]
    fn test_bin_resize_is_idempotent() {
        let mut analyzer = SpectrumAnalyzer::new(256, 100).unwrap();
        analyzer.set_num_freq_bins(48).unwrap();
        analyzer.set_num_freq_bins(48).unwrap();
        fill_sine(analyzer.frame_input_mut(), 4, 0.5);
        analyzer.process_frame();
        assert_eq!(analyzer.spectrum().len(), 48);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(SpectrumAnalyzer::new(0, 32).is_err());
        assert!(SpectrumAnalyzer::new(256, 1).is_err());

        let mut analyzer = SpectrumAnalyzer::new(256, 32).unwrap();
        assert_eq!(analyzer.set_frame_size(0), Err(DspError::ZeroFrameSize));
        assert_eq!(analyzer.set_num_freq_bins(1), Err(DspError::TooFewBins(1)));
        assert_eq!(
            analyzer.set_num_spectrums(0),
            Err(DspError::ZeroHistoryDepth)
        );
        assert!(analyzer.set_domain_shift_factor(0.0).is_err());
        assert!(analyzer.set_domain_shift_factor(f32::INFINITY).is_err());

        // Prior state intact after rejection
        assert_eq!(analyzer.frame_size(), 256);
        assert_eq!(analyzer.num_freq_bins(), 32);
    }

    #[test]
    fn test_amplitude_curve_applies_before_shift() {
        let mut analyzer = SpectrumAnalyzer::new(128, 65).unwrap();
        // A constant curve collapses every magnitude to the same value
        analyzer.set_amplitude_curve(CurveTable::from_samples(vec![0.5]).unwrap());
        fill_sine(analyzer.frame_input_mut(), 3, 1.0);
        analyzer.process_frame();
        for &bin in analyzer.spectrum().bins() {
            assert!((bin - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_peak_curve_holds_neighbors_up() {
        let frame_size = 256;
        let natural = frame_size / 2 + 1;
        let mut plain = SpectrumAnalyzer::new(frame_size, natural).unwrap();
        let mut held = SpectrumAnalyzer::new(frame_size, natural).unwrap();
        held.set_peak_curve(CurveTable::linear(8).unwrap());

        fill_sine(plain.frame_input_mut(), 20, 1.0);
        fill_sine(held.frame_input_mut(), 20, 1.0);
        plain.process_frame();
        held.process_frame();

        // The held spectrum never falls below the plain one and props up
        // the bins adjacent to the peak.
        for (h, p) in held.spectrum().bins().iter().zip(plain.spectrum().bins()) {
            assert!(h >= p);
        }
        assert!(held.spectrum().bins()[21] > plain.spectrum().bins()[21]);
    }
}
