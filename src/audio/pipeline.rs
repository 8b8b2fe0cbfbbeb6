use log::trace;

use crate::config::PipelineSettings;
use crate::dsp::{
    AmplitudeFilter, AverageFilter, CurveTable, DomainShiftFilter, DspError, FrequencySpectrum,
    PeakFilter, SpectrumAnalyzer, SpectrumFilter,
};

use super::ring::FrameRingBuffer;

/// The full capture-to-display pipeline: sample ring buffer, hop-based
/// framing, FFT analyzer, and the amplitude -> domain shift -> peak ->
/// average filter chain.
///
/// The analyzer runs at its natural bin count with an identity shift, so
/// the amplitude curve sees raw FFT bins; the domain-shift stage then owns
/// the visual remap down to the configured display bin count.
///
/// Feed it with `push_samples` whenever audio arrives and call `update`
/// once per render tick; zero, one, or several frames are processed
/// depending on how much audio accumulated since the last tick.
pub struct SpectrumPipeline {
    ring: FrameRingBuffer,
    new_samples: usize,
    frame_gap: usize,
    analyzer: SpectrumAnalyzer,
    amplitude: Option<AmplitudeFilter>,
    domain: DomainShiftFilter,
    peak: Option<PeakFilter>,
    average: AverageFilter,
}

impl SpectrumPipeline {
    pub fn new(settings: &PipelineSettings) -> Result<Self, DspError> {
        settings.validate()?;

        let natural_bins = settings.frame_size / 2 + 1;
        let mut analyzer = SpectrumAnalyzer::new(settings.frame_size, natural_bins)?;
        analyzer.set_num_spectrums(settings.num_spectrums)?;

        let amplitude = match &settings.amplitude_curve {
            Some(samples) => Some(AmplitudeFilter::new(CurveTable::from_samples(
                samples.clone(),
            )?)),
            None => None,
        };
        let peak = match &settings.peak_curve {
            Some(samples) => Some(PeakFilter::new(CurveTable::from_samples(samples.clone())?)),
            None => None,
        };

        Ok(Self {
            ring: FrameRingBuffer::new(settings.frame_size * 2),
            new_samples: 0,
            frame_gap: settings.frame_gap,
            analyzer,
            amplitude,
            domain: DomainShiftFilter::new(settings.num_freq_bins, settings.domain_shift_factor)?,
            peak,
            average: AverageFilter::new(settings.average_depth)?,
        })
    }

    /// Absorb freshly captured mono samples. Returns the number absorbed.
    ///
    /// The hop backlog saturates at the ring capacity: a deeper lookback
    /// would address samples the ring no longer holds.
    pub fn push_samples(&mut self, samples: &[f32]) -> usize {
        self.ring.push(samples);
        self.new_samples = (self.new_samples + samples.len()).min(self.ring.capacity());
        samples.len()
    }

    /// Process one frame per accumulated hop. Returns the number of frames
    /// processed this call.
    pub fn update(&mut self) -> usize {
        let mut frames = 0;
        while self.new_samples >= self.frame_gap {
            self.new_samples -= self.frame_gap;
            self.ring
                .copy_window(self.new_samples, self.analyzer.frame_input_mut());
            self.analyzer.process_frame();

            let spectrum = self.analyzer.spectrum();
            let spectrum = match &mut self.amplitude {
                Some(filter) => filter.apply(spectrum),
                None => spectrum,
            };
            let spectrum = self.domain.apply(spectrum);
            let spectrum = match &mut self.peak {
                Some(filter) => filter.apply(spectrum),
                None => spectrum,
            };
            self.average.apply(spectrum);
            frames += 1;
        }
        if frames > 0 {
            trace!("processed {frames} frames, {} samples pending", self.new_samples);
        }
        frames
    }

    /// Final filtered spectrum, valid until the next `update`.
    pub fn spectrum(&self) -> &FrequencySpectrum {
        self.average.output()
    }

    /// Raw sample window for waveform-style consumers.
    pub fn ring(&self) -> &FrameRingBuffer {
        &self.ring
    }

    pub fn analyzer(&self) -> &SpectrumAnalyzer {
        &self.analyzer
    }

    pub fn frame_gap(&self) -> usize {
        self.frame_gap
    }

    /// Samples accumulated toward the next hop.
    pub fn pending_samples(&self) -> usize {
        self.new_samples
    }

    /// Change the hop size. Takes effect immediately, including for a
    /// backlog already accumulated.
    pub fn set_frame_gap(&mut self, frame_gap: usize) -> Result<(), DspError> {
        if frame_gap == 0 {
            return Err(DspError::ZeroFrameGap);
        }
        self.frame_gap = frame_gap;
        Ok(())
    }

    /// Change the analysis frame length. Resizes the ring to twice the
    /// frame and discards buffered audio and backlog.
    pub fn set_frame_size(&mut self, frame_size: usize) -> Result<(), DspError> {
        // Natural bin count validation also rejects frames of 0 or 1
        self.analyzer.set_num_freq_bins(frame_size / 2 + 1)?;
        self.analyzer.set_frame_size(frame_size)?;
        self.ring.set_capacity(frame_size * 2);
        self.new_samples = 0;
        Ok(())
    }

    /// Change the display bin count produced by the domain-shift stage.
    pub fn set_num_freq_bins(&mut self, num_freq_bins: usize) -> Result<(), DspError> {
        self.domain.set_num_bins(num_freq_bins)
    }

    pub fn set_domain_shift_factor(&mut self, factor: f32) -> Result<(), DspError> {
        self.domain.set_shift_factor(factor)
    }

    /// Analyzer history depth (raw-domain smoothing).
    pub fn set_num_spectrums(&mut self, num_spectrums: usize) -> Result<(), DspError> {
        self.analyzer.set_num_spectrums(num_spectrums)
    }

    /// Average filter depth (display-domain smoothing).
    pub fn set_average_depth(&mut self, depth: usize) -> Result<(), DspError> {
        self.average.set_depth(depth)
    }

    /// Install, replace, or remove the amplitude transfer curve.
    pub fn set_amplitude_curve(&mut self, curve: Option<CurveTable>) {
        match (curve, &mut self.amplitude) {
            (Some(curve), Some(filter)) => filter.set_curve(curve),
            (Some(curve), slot) => *slot = Some(AmplitudeFilter::new(curve)),
            (None, slot) => *slot = None,
        }
    }

    /// Install, replace, or remove the peak-decay curve.
    pub fn set_peak_curve(&mut self, curve: Option<CurveTable>) {
        match (curve, &mut self.peak) {
            (Some(curve), Some(filter)) => filter.set_curve(curve),
            (Some(curve), slot) => *slot = Some(PeakFilter::new(curve)),
            (None, slot) => *slot = None,
        }
    }
}
