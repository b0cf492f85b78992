//! Normalized `f32` sample buffer tagged with its sample rate and channel
//! count.
//!
//! # Example
//!
//! ```rust
//! use speech_session::audio::AudioBuffer;
//!
//! let buf = AudioBuffer::from_pcm16(&[16_384, -16_384], 16_000);
//! assert_eq!(buf.samples, vec![0.5, -0.5]);
//! assert_eq!(buf.to_pcm16(), vec![16_384, -16_384]);
//! ```

use crate::audio::resample::{resample, stereo_to_mono};

/// Divisor that maps a signed 16-bit sample onto `[-1.0, 1.0)`.
pub const PCM16_SCALE: f32 = 32_768.0;

// ---------------------------------------------------------------------------
// AudioBuffer
// ---------------------------------------------------------------------------

/// Interleaved `f32` samples, approximately in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved samples (`channels` values per frame).
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl AudioBuffer {
    /// Wrap mono samples.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Normalize mono 16-bit PCM by dividing each sample by 32768.
    pub fn from_pcm16(pcm: &[i16], sample_rate: u32) -> Self {
        Self::mono(
            pcm.iter().map(|&s| s as f32 / PCM16_SCALE).collect(),
            sample_rate,
        )
    }

    /// Convert back to 16-bit PCM, rounding and saturating at full scale.
    pub fn to_pcm16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|&s| (s * PCM16_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
            .collect()
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            n => self.samples.len() / n as usize,
        }
    }

    /// Returns `true` when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds: `frames × 1000 / sample_rate`.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    /// Average all channels down to mono.
    pub fn into_mono(self) -> Self {
        if self.channels == 1 {
            return self;
        }
        Self::mono(stereo_to_mono(&self.samples, self.channels), self.sample_rate)
    }

    /// Downmix to mono and convert to `target_rate`.
    pub fn to_mono_at(self, target_rate: u32) -> Self {
        let mono = self.into_mono();
        if mono.sample_rate == target_rate {
            return mono;
        }
        Self::mono(
            resample(&mono.samples, mono.sample_rate, target_rate),
            target_rate,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm16_normalization_divides_by_32768() {
        let buf = AudioBuffer::from_pcm16(&[i16::MIN, 0, 16_384], 8_000);
        assert_eq!(buf.samples, vec![-1.0, 0.0, 0.5]);
        assert_eq!(buf.channels, 1);
    }

    #[test]
    fn to_pcm16_saturates() {
        let buf = AudioBuffer::mono(vec![1.5, -1.5, 1.0], 8_000);
        assert_eq!(buf.to_pcm16(), vec![i16::MAX, i16::MIN, i16::MAX]);
    }

    #[test]
    fn duration_uses_frames_not_samples() {
        let stereo = AudioBuffer {
            samples: vec![0.0; 32_000],
            sample_rate: 16_000,
            channels: 2,
        };
        assert_eq!(stereo.frames(), 16_000);
        assert_eq!(stereo.duration_ms(), 1_000);
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        assert_eq!(AudioBuffer::mono(vec![0.0; 10], 0).duration_ms(), 0);
    }

    #[test]
    fn into_mono_averages_channels() {
        let stereo = AudioBuffer {
            samples: vec![1.0, 0.0, 0.5, 0.5],
            sample_rate: 16_000,
            channels: 2,
        };
        let mono = stereo.into_mono();
        assert_eq!(mono.channels, 1);
        assert_eq!(mono.samples, vec![0.5, 0.5]);
    }

    #[test]
    fn to_mono_at_resamples_22050_to_16k() {
        let buf = AudioBuffer::mono(vec![0.0; 22_050], 22_050).to_mono_at(16_000);
        assert_eq!(buf.sample_rate, 16_000);
        assert!(buf.samples.len().abs_diff(16_000) <= 1);
    }
}
