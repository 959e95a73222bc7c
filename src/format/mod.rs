//! Audio format conversion.
//!
//! This module provides the sample-level stages of the bridge:
//! - Anti-aliasing low-pass filtering (windowed-sinc FIR)
//! - Sample rate reduction (filter + linear interpolation)
//! - Sample format conversion (f32 capture → i16, PCM16 bytes ↔ i16)
//!
//! Every stage that can produce a value outside the 16-bit range clamps it
//! and reports the number of clamped samples in [`Converted`].

mod convert;
mod filter;
mod resample;

pub use convert::{
    encode, f32_to_i16, mean_level, pcm16_from_le_bytes, pcm16_to_le_bytes, CaptureEncoder,
};
pub use filter::{build_kernel, FirKernel, LowPassFilter};
pub use resample::{downsample, Resampler};

/// Output of a conversion stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Converted {
    /// Converted PCM16 samples.
    pub samples: Vec<i16>,
    /// Number of samples that had to be clamped into the 16-bit range.
    pub clamped: usize,
}

/// Rounds to the nearest integer, ties toward positive infinity, and clamps
/// into the 16-bit range.
///
/// Returns the sample and whether it was clamped.
#[inline]
pub(crate) fn round_to_i16(value: f64) -> (i16, bool) {
    if value.is_nan() {
        return (0, true);
    }
    let rounded = (value + 0.5).floor();
    if rounded > f64::from(i16::MAX) {
        (i16::MAX, true)
    } else if rounded < f64::from(i16::MIN) {
        (i16::MIN, true)
    } else {
        (rounded as i16, false)
    }
}
