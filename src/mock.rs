//! Synthetic audio for driving the bridge without a model or microphone.

use std::time::Duration;

use crate::chunk::position;
use crate::config::{CAPTURE_SAMPLE_RATE, SYNTHESIS_SAMPLE_RATE};
use crate::format::pcm16_to_le_bytes;

/// Generates synthetic mono PCM16 audio for tests and demos.
///
/// Accumulated samples can be replayed as synthesis deltas (integer PCM16,
/// raw or as little-endian bytes) or as microphone blocks (float samples in
/// [-1, 1]).
///
/// # Example
///
/// ```
/// use voice_bridge::MockSource;
///
/// let mut mock = MockSource::synthesis();
///
/// // 100ms of silence followed by 100ms of a 440Hz tone
/// mock.generate_silence(100);
/// mock.generate_sine(440.0, 100);
///
/// let deltas: Vec<&[i16]> = mock.deltas(1200).collect();
/// assert_eq!(deltas.len(), 4);
/// ```
pub struct MockSource {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl MockSource {
    /// Creates a new mock source at the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
        }
    }

    /// Creates a mock source at the synthesis rate (24kHz).
    pub fn synthesis() -> Self {
        Self::new(SYNTHESIS_SAMPLE_RATE)
    }

    /// Creates a mock source at the microphone capture rate (24kHz).
    pub fn capture() -> Self {
        Self::new(CAPTURE_SAMPLE_RATE)
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Generates silence for the given duration in milliseconds.
    pub fn generate_silence(&mut self, duration_ms: u64) {
        let num_samples = self.samples_for_duration(duration_ms);
        self.samples.resize(self.samples.len() + num_samples, 0);
    }

    /// Generates a full-scale sine wave at the given frequency.
    pub fn generate_sine(&mut self, frequency: f64, duration_ms: u64) {
        self.generate_tone(frequency, duration_ms, 1.0);
    }

    /// Generates a sine wave with peak `amplitude` (0.0 to 1.0).
    pub fn generate_tone(&mut self, frequency: f64, duration_ms: u64, amplitude: f64) {
        let num_samples = self.samples_for_duration(duration_ms);
        let sample_rate = f64::from(self.sample_rate);
        let peak = amplitude.clamp(0.0, 1.0) * 32767.0;

        self.samples.extend((0..num_samples).map(|i| {
            let t = i as f64 / sample_rate;
            ((2.0 * std::f64::consts::PI * frequency * t).sin() * peak) as i16
        }));
    }

    /// Generates white noise for the given duration.
    pub fn generate_noise(&mut self, duration_ms: u64, amplitude: f64) {
        let num_samples = self.samples_for_duration(duration_ms);
        let amplitude = (amplitude.clamp(0.0, 1.0) * 32767.0) as i16;

        // Simple LCG for deterministic "random" noise
        let mut seed: u32 = 12345;
        for _ in 0..num_samples {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let random = ((seed >> 16) as i32 - 32768) as i16;
            let sample = (i32::from(random) * i32::from(amplitude) / 32767) as i16;
            self.samples.push(sample);
        }
    }

    /// Adds raw samples directly.
    pub fn add_samples(&mut self, samples: &[i16]) {
        self.samples.extend_from_slice(samples);
    }

    /// Takes all accumulated samples, clearing the internal buffer.
    pub fn take_samples(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.samples)
    }

    /// Returns a reference to the accumulated samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Returns the duration of accumulated samples.
    pub fn duration(&self) -> Duration {
        position(self.samples.len() as u64, self.sample_rate)
    }

    /// Splits the accumulated samples into synthesis deltas of at most
    /// `delta_len` samples. The last delta may be shorter.
    pub fn deltas(&self, delta_len: usize) -> impl Iterator<Item = &[i16]> {
        self.samples.chunks(delta_len.max(1))
    }

    /// Splits the accumulated samples into little-endian PCM16 byte deltas.
    pub fn byte_deltas(&self, delta_len: usize) -> Vec<Vec<u8>> {
        self.deltas(delta_len).map(pcm16_to_le_bytes).collect()
    }

    /// Splits the accumulated samples into float microphone blocks of at
    /// most `block_size` samples, scaled to [-1, 1).
    pub fn capture_blocks(&self, block_size: usize) -> Vec<Vec<f32>> {
        self.deltas(block_size)
            .map(|block| block.iter().map(|&s| f32::from(s) / 32768.0).collect())
            .collect()
    }

    fn samples_for_duration(&self, duration_ms: u64) -> usize {
        (u64::from(self.sample_rate) * duration_ms / 1000) as usize
    }
}
