//! Configuration types for the audio bridge.

use std::time::Duration;

use crate::BridgeError;

/// Sample rate of speech-synthesis deltas from the realtime model.
pub const SYNTHESIS_SAMPLE_RATE: u32 = 24_000;

/// Sample rate accepted by the avatar renderer.
pub const PLAYBACK_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of microphone capture blocks.
pub const CAPTURE_SAMPLE_RATE: u32 = 24_000;

/// Number of float samples delivered per microphone callback.
pub const CAPTURE_BLOCK_SIZE: usize = 2048;

/// Default anti-aliasing FIR length.
pub const DEFAULT_FILTER_TAPS: usize = 31;

/// Cutoff as a fraction of the output rate, a margin below its Nyquist frequency.
pub const DEFAULT_CUTOFF_RATIO: f64 = 0.45;

/// Configuration for bridge behavior.
///
/// Use [`BridgeConfig::default()`] for the realtime-model/avatar defaults,
/// or customize as needed.
///
/// # Example
///
/// ```
/// use voice_bridge::BridgeConfig;
///
/// let config = BridgeConfig {
///     max_pending_chunks: Some(64),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Sample rate of inbound synthesis deltas.
    ///
    /// Default: 24000
    pub synthesis_sample_rate: u32,

    /// Sample rate of chunks forwarded to the playback sink.
    ///
    /// Must not exceed `synthesis_sample_rate`.
    /// Default: 16000
    pub playback_sample_rate: u32,

    /// Sample rate of microphone blocks. Capture audio is forwarded at this
    /// rate without conversion.
    ///
    /// Default: 24000
    pub capture_sample_rate: u32,

    /// Number of taps in the anti-aliasing filter. Must be odd.
    ///
    /// Default: 31
    pub filter_taps: usize,

    /// Filter cutoff as a fraction of `playback_sample_rate`.
    ///
    /// Default: 0.45
    pub cutoff_ratio: f64,

    /// High-water mark for pending playback chunks.
    ///
    /// When set and exceeded, the oldest pending chunks are dropped and a
    /// [`BridgeEvent::QueueOverflow`] is emitted. `None` leaves the queue
    /// unbounded.
    /// Default: `None`
    ///
    /// [`BridgeEvent::QueueOverflow`]: crate::BridgeEvent::QueueOverflow
    pub max_pending_chunks: Option<usize>,

    /// Number of forward attempts per playback chunk before it is dropped.
    ///
    /// Default: 1 (drop-and-continue)
    pub sink_retry_attempts: u32,

    /// Initial delay between playback forward attempts.
    ///
    /// Uses exponential backoff (delay doubles each attempt).
    /// Default: 100ms
    pub sink_retry_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            synthesis_sample_rate: SYNTHESIS_SAMPLE_RATE,
            playback_sample_rate: PLAYBACK_SAMPLE_RATE,
            capture_sample_rate: CAPTURE_SAMPLE_RATE,
            filter_taps: DEFAULT_FILTER_TAPS,
            cutoff_ratio: DEFAULT_CUTOFF_RATIO,
            max_pending_chunks: None,
            sink_retry_attempts: 1,
            sink_retry_delay: Duration::from_millis(100),
        }
    }
}

impl BridgeConfig {
    /// Checks the configuration for values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.synthesis_sample_rate == 0
            || self.playback_sample_rate == 0
            || self.capture_sample_rate == 0
        {
            return Err(BridgeError::invalid_config("sample rates must be non-zero"));
        }
        if self.playback_sample_rate > self.synthesis_sample_rate {
            return Err(BridgeError::UnsupportedOperation {
                from_rate: self.synthesis_sample_rate,
                to_rate: self.playback_sample_rate,
            });
        }
        if self.filter_taps == 0 || self.filter_taps % 2 == 0 {
            return Err(BridgeError::invalid_config(format!(
                "filter_taps must be odd, got {}",
                self.filter_taps
            )));
        }
        if !(self.cutoff_ratio > 0.0 && self.cutoff_ratio < 0.5) {
            return Err(BridgeError::invalid_config(format!(
                "cutoff_ratio must be in (0, 0.5), got {}",
                self.cutoff_ratio
            )));
        }
        if self.max_pending_chunks == Some(0) {
            return Err(BridgeError::invalid_config(
                "max_pending_chunks must be at least 1",
            ));
        }
        if self.sink_retry_attempts == 0 {
            return Err(BridgeError::invalid_config(
                "sink_retry_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_config_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.synthesis_sample_rate, 24000);
        assert_eq!(config.playback_sample_rate, 16000);
        assert_eq!(config.capture_sample_rate, 24000);
        assert_eq!(config.filter_taps, 31);
        assert!((config.cutoff_ratio - 0.45).abs() < f64::EPSILON);
        assert_eq!(config.max_pending_chunks, None);
        assert_eq!(config.sink_retry_attempts, 1);
        assert_eq!(config.sink_retry_delay, Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_upsampling_playback() {
        let config = BridgeConfig {
            playback_sample_rate: 48000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BridgeError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_even_taps() {
        let config = BridgeConfig {
            filter_taps: 32,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BridgeError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_high_water_mark() {
        let config = BridgeConfig {
            max_pending_chunks: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_cutoff_above_nyquist() {
        let config = BridgeConfig {
            cutoff_ratio: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
