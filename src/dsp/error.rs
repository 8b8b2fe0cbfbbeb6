use thiserror::Error;

/// Configuration errors raised at the setter boundary.
///
/// Every mutator validates before touching any state, so a rejected call
/// leaves the previous configuration intact.
#[derive(Debug, Error, PartialEq)]
pub enum DspError {
    #[error("frame size must be at least 1")]
    ZeroFrameSize,

    #[error("need at least 2 frequency bins, got {0}")]
    TooFewBins(usize),

    #[error("spectrum history depth must be at least 1")]
    ZeroHistoryDepth,

    #[error("domain shift factor must be positive and finite, got {0}")]
    BadShiftFactor(f32),

    #[error("curve table must contain at least one sample")]
    EmptyCurve,

    #[error("frame gap must be at least 1")]
    ZeroFrameGap,
}
