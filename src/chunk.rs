//! Audio data chunk with metadata.

use std::sync::Arc;
use std::time::Duration;

/// A buffer of mono PCM16 samples with associated metadata.
///
/// `AudioChunk` is the unit handed to sinks on both the playback and the
/// capture path. Samples are stored in an `Arc<Vec<i16>>` so a chunk can be
/// retried or recorded without copying.
///
/// # Example
///
/// ```
/// use voice_bridge::AudioChunk;
/// use std::time::Duration;
///
/// let chunk = AudioChunk::new(vec![0i16; 1600], 16000);
/// assert_eq!(chunk.duration(), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// PCM audio samples in 16-bit signed integer format.
    pub samples: Arc<Vec<i16>>,

    /// Position of the first sample from the start of its stream.
    pub timestamp: Duration,

    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Order of this chunk within its stream, starting at 0.
    pub sequence: u64,
}

impl AudioChunk {
    /// Creates a chunk at the start of a stream.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            timestamp: Duration::ZERO,
            sample_rate,
            sequence: 0,
        }
    }

    /// Sets the stream position of this chunk.
    #[must_use]
    pub fn at(mut self, sequence: u64, timestamp: Duration) -> Self {
        self.sequence = sequence;
        self.timestamp = timestamp;
        self
    }

    /// Returns the duration of this audio chunk.
    pub fn duration(&self) -> Duration {
        position(self.samples.len() as u64, self.sample_rate)
    }

    /// Returns the number of samples in this chunk.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if this chunk contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Converts a sample count at `sample_rate` into a stream position.
pub(crate) fn position(samples: u64, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let nanos = u128::from(samples) * 1_000_000_000 / u128::from(sample_rate);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_16khz() {
        let chunk = AudioChunk::new(vec![0i16; 1600], 16000);
        assert_eq!(chunk.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_duration_24khz_capture_block() {
        let chunk = AudioChunk::new(vec![0i16; 2400], 24000);
        assert_eq!(chunk.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_at_sets_position() {
        let chunk = AudioChunk::new(vec![1, 2, 3], 16000).at(7, Duration::from_millis(250));
        assert_eq!(chunk.sequence, 7);
        assert_eq!(chunk.timestamp, Duration::from_millis(250));
    }

    #[test]
    fn test_empty_chunk() {
        let chunk = AudioChunk::new(vec![], 16000);
        assert!(chunk.is_empty());
        assert_eq!(chunk.len(), 0);
        assert_eq!(chunk.duration(), Duration::ZERO);
    }

    #[test]
    fn test_zero_sample_rate() {
        let chunk = AudioChunk::new(vec![0i16; 100], 0);
        assert_eq!(chunk.duration(), Duration::ZERO);
    }

    #[test]
    fn test_position() {
        assert_eq!(position(8000, 16000), Duration::from_millis(500));
        assert_eq!(position(8000, 0), Duration::ZERO);
    }
}
