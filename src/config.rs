use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dsp::DspError;

/// Every knob of the spectrum pipeline, as persisted to disk.
///
/// Curve tables are stored as raw sample arrays over [0, 1]; `None` leaves
/// the corresponding stage out of the chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSettings {
    /// FFT analysis window length in samples.
    pub frame_size: usize,
    /// Hop size: a new frame is processed per this many fresh samples.
    pub frame_gap: usize,
    /// Output bin count after the visual domain shift.
    pub num_freq_bins: usize,
    /// Exponent of the domain remap; 1.0 leaves the spectrum linear.
    pub domain_shift_factor: f32,
    /// Analyzer history depth (raw-domain smoothing, before remapping).
    pub num_spectrums: usize,
    /// Average filter depth (display-domain smoothing, end of chain).
    pub average_depth: usize,
    /// Amplitude transfer curve, sampled over [0, 1].
    pub amplitude_curve: Option<Vec<f32>>,
    /// Peak-decay profile; last sample is the value at the peak.
    pub peak_curve: Option<Vec<f32>>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            frame_size: 1024,
            frame_gap: 256,
            num_freq_bins: 256,
            domain_shift_factor: 3.0,
            num_spectrums: 2,
            average_depth: 8,
            amplitude_curve: None,
            peak_curve: Some(default_peak_curve()),
        }
    }
}

/// Rising power curve: holds near the peak, falls off toward the tail.
fn default_peak_curve() -> Vec<f32> {
    let len = 64;
    (0..len)
        .map(|i| (i as f32 / (len - 1) as f32).powi(2))
        .collect()
}

impl PipelineSettings {
    /// Apply the same rules the pipeline setters enforce, so a bad settings
    /// file is rejected before any state is built from it.
    pub fn validate(&self) -> Result<(), DspError> {
        if self.frame_size == 0 {
            return Err(DspError::ZeroFrameSize);
        }
        if self.frame_gap == 0 {
            return Err(DspError::ZeroFrameGap);
        }
        if self.num_freq_bins < 2 {
            return Err(DspError::TooFewBins(self.num_freq_bins));
        }
        if !(self.domain_shift_factor > 0.0 && self.domain_shift_factor.is_finite()) {
            return Err(DspError::BadShiftFactor(self.domain_shift_factor));
        }
        if self.num_spectrums == 0 || self.average_depth == 0 {
            return Err(DspError::ZeroHistoryDepth);
        }
        for curve in [&self.amplitude_curve, &self.peak_curve].into_iter().flatten() {
            if curve.is_empty() {
                return Err(DspError::EmptyCurve);
            }
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings from {:?}", path.as_ref()))?;
        let settings: Self = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse settings in {:?}", path.as_ref()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write settings to {:?}", path.as_ref()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PipelineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = PipelineSettings::default();
        settings.num_freq_bins = 1;
        assert_eq!(settings.validate(), Err(DspError::TooFewBins(1)));

        let mut settings = PipelineSettings::default();
        settings.frame_gap = 0;
        assert_eq!(settings.validate(), Err(DspError::ZeroFrameGap));

        let mut settings = PipelineSettings::default();
        settings.peak_curve = Some(vec![]);
        assert_eq!(settings.validate(), Err(DspError::EmptyCurve));
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = PipelineSettings::default();
        settings.amplitude_curve = Some(vec![0.0, 0.5, 1.0]);

        let path = std::env::temp_dir().join("livespec_settings_test.json");
        settings.save(&path).unwrap();
        let loaded = PipelineSettings::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(settings, loaded);
    }
}
