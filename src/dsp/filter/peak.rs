use crate::dsp::{CurveTable, FrequencySpectrum};

use super::SpectrumFilter;

/// One "walk and decay" state machine.
///
/// A sample at or above the current floor (or one reached after the decay
/// curve is exhausted) becomes the new peak; every other sample advances the
/// walk one step down the curve. The curve is indexed in reverse: its last
/// sample is the value at the peak, its first the fully decayed value.
struct DecayWalk<'a> {
    curve: &'a CurveTable,
    peak: f32,
    curve_pos: usize,
    floor: f32,
}

impl<'a> DecayWalk<'a> {
    fn new(curve: &'a CurveTable) -> Self {
        Self {
            curve,
            peak: 0.0,
            curve_pos: 0,
            floor: 0.0,
        }
    }

    /// Advance over one sample and return the decayed floor at its position.
    fn step(&mut self, sample: f32) -> f32 {
        if sample >= self.floor || self.curve_pos >= self.curve.len() {
            self.peak = sample;
            self.curve_pos = 0;
        } else {
            self.curve_pos += 1;
        }
        self.floor = if self.curve_pos >= self.curve.len() {
            // Walked past the end of the curve: fully decayed.
            0.0
        } else {
            let lag_index = self.curve.len() - 1 - self.curve_pos;
            self.peak * self.curve.sample_clamped(lag_index)
        };
        self.floor
    }
}

/// Left-to-right pass: hold every sample up to the decayed floor of the most
/// recent peak, writing into `out` so the original input stays intact for
/// the backward pass.
fn scan_forward(input: &[f32], curve: &CurveTable, out: &mut Vec<f32>) {
    out.clear();
    out.resize(input.len(), 0.0);
    let mut walk = DecayWalk::new(curve);
    for (slot, &sample) in out.iter_mut().zip(input) {
        let floor = walk.step(sample);
        *slot = sample.max(floor);
    }
}

/// Right-to-left pass over the original input, combined with the forward
/// result via `max`. Runs in place: each slot is read before it is
/// overwritten and the walk never revisits a slot.
fn scan_backward_combine(data: &mut [f32], curve: &CurveTable, forward: &[f32]) {
    let mut walk = DecayWalk::new(curve);
    for i in (0..data.len()).rev() {
        let sample = data[i];
        let floor = walk.step(sample);
        data[i] = forward[i].max(sample.max(floor));
    }
}

/// Bidirectional peak-decay smoothing of `data`, as used by the analyzer on
/// its freshly written history slot.
pub(crate) fn smooth_in_place(data: &mut [f32], curve: &CurveTable, forward_tmp: &mut Vec<f32>) {
    scan_forward(data, curve, forward_tmp);
    scan_backward_combine(data, curve, forward_tmp);
}

/// Peak-hold-with-decay stage: no bin ever drops faster after a local
/// maximum than the decay curve allows, on either side of the peak.
#[derive(Debug)]
pub struct PeakFilter {
    curve: CurveTable,
    forward: Vec<f32>,
    output: FrequencySpectrum,
}

impl PeakFilter {
    pub fn new(curve: CurveTable) -> Self {
        Self {
            curve,
            forward: Vec::new(),
            output: FrequencySpectrum::default(),
        }
    }

    /// Replace the decay curve wholesale.
    pub fn set_curve(&mut self, curve: CurveTable) {
        self.curve = curve;
    }

    pub fn curve(&self) -> &CurveTable {
        &self.curve
    }
}

impl SpectrumFilter for PeakFilter {
    fn apply(&mut self, input: &FrequencySpectrum) -> &FrequencySpectrum {
        scan_forward(input.bins(), &self.curve, &mut self.forward);
        self.output.copy_from(input.bins());
        scan_backward_combine(self.output.bins_mut(), &self.curve, &self.forward);
        &self.output
    }

    fn output(&self) -> &FrequencySpectrum {
        &self.output
    }
}
