//! Sample format conversion.

use super::Converted;
use crate::BridgeError;

/// Converts one f32 sample to i16.
///
/// Input is clamped to [-1.0, 1.0], scaled by 32767 and floored. Inputs at
/// or below -1.0 map to -32768, the full negative scale. NaN maps to 0.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    if sample <= -1.0 {
        return i16::MIN;
    }
    let s = f64::from(sample.min(1.0));
    (s * 32767.0).floor() as i16
}

/// Converts a block of f32 microphone samples to PCM16.
///
/// # Example
///
/// ```
/// use voice_bridge::format::encode;
///
/// let pcm = encode(&[0.0, 1.0, -1.0, 1.5, -1.5]);
/// assert_eq!(pcm, vec![0, 32767, -32768, 32767, -32768]);
/// ```
pub fn encode(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| f32_to_i16(s)).collect()
}

/// Stateless capture-path encoder that also counts out-of-range input.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureEncoder;

impl CaptureEncoder {
    /// Creates an encoder.
    pub fn new() -> Self {
        Self
    }

    /// Encodes a capture block, reporting how many inputs lay outside
    /// [-1.0, 1.0] (or were NaN) and had to be clamped.
    pub fn encode(&self, block: &[f32]) -> Converted {
        let clamped = block
            .iter()
            .filter(|s| s.is_nan() || s.abs() > 1.0)
            .count();
        Converted {
            samples: encode(block),
            clamped,
        }
    }
}

/// Mean absolute level of a block after clamping to [-1.0, 1.0].
///
/// Returns 0.0 for an empty block.
pub fn mean_level(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let sum: f64 = block
        .iter()
        .filter(|s| !s.is_nan())
        .map(|s| f64::from(s.clamp(-1.0, 1.0).abs()))
        .sum();
    (sum / block.len() as f64) as f32
}

/// Decodes little-endian PCM16 bytes, as delivered by the realtime model.
pub fn pcm16_from_le_bytes(bytes: &[u8]) -> Result<Vec<i16>, BridgeError> {
    if bytes.len() % 2 != 0 {
        return Err(BridgeError::MalformedPcm { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Encodes PCM16 samples as little-endian bytes.
pub fn pcm16_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_full_range() {
        assert_eq!(f32_to_i16(1.0), 32767);
        assert_eq!(f32_to_i16(-1.0), -32768);
        assert_eq!(f32_to_i16(0.0), 0);
    }

    #[test]
    fn test_f32_to_i16_floors() {
        assert_eq!(f32_to_i16(0.5), 16383);
        assert_eq!(f32_to_i16(-0.5), -16384);
        // Tiny negative values floor to -1, not 0
        assert_eq!(f32_to_i16(-1e-6), -1);
    }

    #[test]
    fn test_f32_to_i16_negative_interior_scale() {
        assert_eq!(f32_to_i16(-0.99), -32440);
        assert_eq!(f32_to_i16(-0.25), -8192);
        assert_eq!(f32_to_i16(-0.999_99), -32767);
    }

    #[test]
    fn test_f32_to_i16_clamping() {
        assert_eq!(f32_to_i16(2.5), 32767);
        assert_eq!(f32_to_i16(-3.0), -32768);
        assert_eq!(f32_to_i16(f32::INFINITY), 32767);
        assert_eq!(f32_to_i16(f32::NEG_INFINITY), -32768);
        assert_eq!(f32_to_i16(f32::NAN), 0);
    }

    #[test]
    fn test_encode_block() {
        assert_eq!(
            encode(&[0.0, 1.0, -1.0, 1.5, -1.5]),
            vec![0, 32767, -32768, 32767, -32768]
        );
    }

    #[test]
    fn test_capture_encoder_counts_clamped() {
        let out = CaptureEncoder::new().encode(&[0.25, 1.0, 1.01, -7.0, f32::NAN]);
        assert_eq!(out.samples, vec![8191, 32767, 32767, -32768, 0]);
        assert_eq!(out.clamped, 3);
    }

    #[test]
    fn test_encode_arbitrary_input_stays_in_range() {
        // Deterministic sweep over a wide float range
        let block: Vec<f32> = (-2000..=2000).map(|i| i as f32 * 0.0037).collect();
        let pcm = encode(&block);
        assert_eq!(pcm.len(), block.len());
        assert_eq!(pcm.first(), Some(&-32768));
        assert_eq!(pcm.last(), Some(&32767));
    }

    #[test]
    fn test_mean_level() {
        assert!((mean_level(&[0.5, -0.5, 1.0, -2.0]) - 0.75).abs() < 1e-6);
        assert_eq!(mean_level(&[]), 0.0);
    }

    #[test]
    fn test_pcm16_from_le_bytes() {
        let samples = pcm16_from_le_bytes(&[0x01, 0x00, 0xff, 0xff, 0x00, 0x80]).unwrap();
        assert_eq!(samples, vec![1, -1, -32768]);
    }

    #[test]
    fn test_pcm16_from_odd_bytes() {
        assert!(matches!(
            pcm16_from_le_bytes(&[0x01, 0x00, 0xff]),
            Err(BridgeError::MalformedPcm { len: 3 })
        ));
    }

    #[test]
    fn test_pcm16_to_le_bytes() {
        assert_eq!(pcm16_to_le_bytes(&[1, -1]), vec![0x01, 0x00, 0xff, 0xff]);
    }
}
