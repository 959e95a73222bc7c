//! Sample rate reduction.
//!
//! Downsampling runs the input through a low-pass filter with a cutoff just
//! below the target Nyquist frequency, then picks output samples by linear
//! interpolation between neighbouring filtered samples. Upsampling is
//! rejected.

use super::filter::{FirKernel, LowPassFilter};
use super::{round_to_i16, Converted};
use crate::config::{DEFAULT_CUTOFF_RATIO, DEFAULT_FILTER_TAPS};
use crate::BridgeError;

/// A fixed-ratio downsampler.
///
/// Building the filter kernel is the expensive part, so a `Resampler` is
/// built once per rate pair and reused for every buffer.
///
/// # Example
///
/// ```
/// use voice_bridge::format::Resampler;
///
/// let resampler = Resampler::new(24000, 16000).unwrap();
/// let out = resampler.process(&[1000, -1000, 500, -500, 250]);
/// assert_eq!(out.samples, vec![300, -191, -42]);
/// ```
#[derive(Debug, Clone)]
pub struct Resampler {
    from_rate: u32,
    to_rate: u32,
    // None when the rates are equal
    filter: Option<LowPassFilter>,
}

impl Resampler {
    /// Creates a resampler with the default 31-tap filter and a cutoff at
    /// 0.45 × `to_rate`.
    pub fn new(from_rate: u32, to_rate: u32) -> Result<Self, BridgeError> {
        Self::with_filter(from_rate, to_rate, DEFAULT_FILTER_TAPS, DEFAULT_CUTOFF_RATIO)
    }

    /// Creates a resampler with a custom filter length and cutoff ratio.
    pub fn with_filter(
        from_rate: u32,
        to_rate: u32,
        num_taps: usize,
        cutoff_ratio: f64,
    ) -> Result<Self, BridgeError> {
        if from_rate == to_rate {
            return Ok(Self {
                from_rate,
                to_rate,
                filter: None,
            });
        }
        if to_rate > from_rate {
            return Err(BridgeError::UnsupportedOperation { from_rate, to_rate });
        }
        if to_rate == 0 {
            return Err(BridgeError::InvalidSampleRate { rate: 0 });
        }

        let cutoff_hz = f64::from(to_rate) * cutoff_ratio;
        let kernel = FirKernel::low_pass(cutoff_hz, from_rate, num_taps)?;

        Ok(Self {
            from_rate,
            to_rate,
            filter: Some(LowPassFilter::with_kernel(kernel)),
        })
    }

    /// Input sample rate in Hz.
    pub fn from_rate(&self) -> u32 {
        self.from_rate
    }

    /// Output sample rate in Hz.
    pub fn to_rate(&self) -> u32 {
        self.to_rate
    }

    /// Returns `true` if this resampler passes samples through unchanged.
    pub fn is_identity(&self) -> bool {
        self.filter.is_none()
    }

    /// Number of output samples produced for `input_len` input samples.
    pub fn output_len(&self, input_len: usize) -> usize {
        if self.is_identity() {
            return input_len;
        }
        (input_len as u64 * u64::from(self.to_rate) / u64::from(self.from_rate)) as usize
    }

    /// Downsamples one buffer.
    ///
    /// Each buffer is processed independently; the filter does not carry
    /// state across calls.
    pub fn process(&self, samples: &[i16]) -> Converted {
        let Some(filter) = &self.filter else {
            return Converted {
                samples: samples.to_vec(),
                clamped: 0,
            };
        };

        let filtered = filter.apply(samples);
        let source = &filtered.samples;
        let output_len = self.output_len(samples.len());
        let from = u64::from(self.from_rate);
        let to = u64::from(self.to_rate);

        let mut out = Converted {
            samples: Vec::with_capacity(output_len),
            clamped: filtered.clamped,
        };

        for i in 0..output_len as u64 {
            // position = i × from / to, split into integer index and fraction
            let scaled = i * from;
            let index = (scaled / to) as usize;
            let fraction = (scaled % to) as f64 / to as f64;

            let sample = if index + 1 < source.len() {
                let a = f64::from(source[index]);
                let b = f64::from(source[index + 1]);
                let (sample, clamped) = round_to_i16(a + fraction * (b - a));
                out.clamped += usize::from(clamped);
                sample
            } else {
                source[index]
            };
            out.samples.push(sample);
        }

        out
    }
}

/// Downsamples `samples` from `from_rate` to `to_rate`.
///
/// Equal rates return a copy of the input. A `to_rate` above `from_rate`
/// fails with [`BridgeError::UnsupportedOperation`]; an empty buffer yields
/// an empty buffer.
pub fn downsample(samples: &[i16], from_rate: u32, to_rate: u32) -> Result<Vec<i16>, BridgeError> {
    Ok(Resampler::new(from_rate, to_rate)?.process(samples).samples)
}
