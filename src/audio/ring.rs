/// Sliding window of the most recent audio samples.
///
/// Samples are kept contiguous in temporal order (oldest first) so frame
/// extraction is a plain slice copy. Pushing shifts existing samples left
/// and discards the oldest; a burst larger than the capacity keeps only its
/// tail. The buffer always holds exactly `capacity` samples, zero-filled at
/// start.
#[derive(Debug, Clone)]
pub struct FrameRingBuffer {
    samples: Vec<f32>,
}

impl FrameRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// All buffered samples, oldest first. The tail is the newest audio;
    /// waveform consumers read this directly.
    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    /// Shift in `new` samples, discarding the same number of oldest ones.
    pub fn push(&mut self, new: &[f32]) {
        let capacity = self.samples.len();
        if capacity == 0 {
            return;
        }
        if new.len() >= capacity {
            self.samples.copy_from_slice(&new[new.len() - capacity..]);
        } else {
            self.samples.copy_within(new.len().., 0);
            self.samples[capacity - new.len()..].copy_from_slice(new);
        }
    }

    /// Copy a window of `out.len()` contiguous samples ending `lookback`
    /// samples before the newest one. The start index clamps to 0, so a
    /// lookback near the capacity still yields a full window from the
    /// oldest samples.
    pub fn copy_window(&self, lookback: usize, out: &mut [f32]) {
        let capacity = self.samples.len();
        debug_assert!(out.len() <= capacity, "window larger than ring");

        let end = capacity - lookback.min(capacity);
        let start = end.saturating_sub(out.len());
        out.copy_from_slice(&self.samples[start..start + out.len()]);
    }

    /// Reallocate to `capacity`, discarding all buffered audio.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.samples = vec![0.0; capacity];
    }
}
