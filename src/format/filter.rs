//! Windowed-sinc anti-aliasing filter.

use std::f64::consts::PI;

use super::{round_to_i16, Converted};
use crate::config::DEFAULT_FILTER_TAPS;
use crate::BridgeError;

/// Low-pass FIR kernel with unity DC gain.
///
/// The kernel has an odd number of taps, is symmetric around its center tap
/// and its taps sum to 1.0. Taps are computed and applied in f64, so filter
/// output can differ by one LSB from an implementation that stores the
/// kernel in f32.
#[derive(Debug, Clone, PartialEq)]
pub struct FirKernel {
    taps: Vec<f64>,
}

impl FirKernel {
    /// Builds a Hamming-windowed sinc low-pass kernel.
    ///
    /// `cutoff_hz` must lie in (0, `sample_rate_hz` / 2] and `num_taps` must
    /// be odd. A cutoff at Nyquist degenerates to a single center tap.
    pub fn low_pass(
        cutoff_hz: f64,
        sample_rate_hz: u32,
        num_taps: usize,
    ) -> Result<Self, BridgeError> {
        if sample_rate_hz == 0 {
            return Err(BridgeError::InvalidSampleRate { rate: 0 });
        }
        if num_taps == 0 || num_taps % 2 == 0 {
            return Err(BridgeError::invalid_filter(format!(
                "tap count must be odd, got {num_taps}"
            )));
        }
        let nyquist = f64::from(sample_rate_hz) / 2.0;
        if !(cutoff_hz > 0.0 && cutoff_hz <= nyquist) {
            return Err(BridgeError::invalid_filter(format!(
                "cutoff {cutoff_hz}Hz outside (0, {nyquist}Hz]"
            )));
        }

        let fc = cutoff_hz / f64::from(sample_rate_hz);
        let center = (num_taps - 1) / 2;
        let span = (num_taps - 1) as f64;

        let mut taps: Vec<f64> = (0..num_taps)
            .map(|i| {
                let sinc = if i == center {
                    2.0 * PI * fc
                } else {
                    let k = i as f64 - center as f64;
                    (2.0 * PI * fc * k).sin() / k
                };
                // Single-tap kernels have no window span.
                let window = if num_taps == 1 {
                    1.0
                } else {
                    0.54 - 0.46 * (2.0 * PI * i as f64 / span).cos()
                };
                sinc * window
            })
            .collect();

        let sum: f64 = taps.iter().sum();
        if sum.abs() < f64::EPSILON {
            return Err(BridgeError::invalid_filter("kernel taps sum to zero"));
        }
        for tap in &mut taps {
            *tap /= sum;
        }

        Ok(Self { taps })
    }

    /// Returns the filter taps.
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Returns the number of taps.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Always `false`; a kernel has at least one tap.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Index of the center tap.
    pub fn center(&self) -> usize {
        (self.taps.len() - 1) / 2
    }
}

/// Builds the default 31-tap low-pass kernel.
pub fn build_kernel(cutoff_hz: f64, sample_rate_hz: u32) -> Result<FirKernel, BridgeError> {
    FirKernel::low_pass(cutoff_hz, sample_rate_hz, DEFAULT_FILTER_TAPS)
}

/// Anti-aliasing filter applied before rate reduction.
///
/// # Example
///
/// ```
/// use voice_bridge::format::LowPassFilter;
///
/// let filter = LowPassFilter::new(7200.0, 24000).unwrap();
/// let out = filter.apply(&[1000, -1000, 500, -500, 250]);
/// assert_eq!(out.samples.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    kernel: FirKernel,
}

impl LowPassFilter {
    /// Creates a filter with the default kernel length.
    pub fn new(cutoff_hz: f64, sample_rate_hz: u32) -> Result<Self, BridgeError> {
        Ok(Self::with_kernel(build_kernel(cutoff_hz, sample_rate_hz)?))
    }

    /// Creates a filter around an existing kernel.
    pub fn with_kernel(kernel: FirKernel) -> Self {
        Self { kernel }
    }

    /// Returns the filter kernel.
    pub fn kernel(&self) -> &FirKernel {
        &self.kernel
    }

    /// Convolves `samples` with the kernel, centered on each output index.
    ///
    /// Positions outside the buffer contribute zero. Output has the same
    /// length as the input; results are rounded and clamped to 16 bits.
    pub fn apply(&self, samples: &[i16]) -> Converted {
        let taps = self.kernel.taps();
        let center = self.kernel.center();
        let len = samples.len();

        let mut out = Converted {
            samples: Vec::with_capacity(len),
            clamped: 0,
        };

        for i in 0..len {
            let mut acc = 0.0;
            for (j, &tap) in taps.iter().enumerate() {
                // idx = i - j + center, negative once j passes i + center
                let Some(idx) = (i + center).checked_sub(j) else {
                    break;
                };
                if idx < len {
                    acc += tap * f64::from(samples[idx]);
                }
            }
            let (sample, clamped) = round_to_i16(acc);
            out.clamped += usize::from(clamped);
            out.samples.push(sample);
        }

        out
    }
}
