//! Sample-rate conversion and channel mixing.
//!
//! The Whisper engine requires **16 kHz mono `f32`** audio.  This module
//! provides the two conversion steps:
//!
//! 1. [`stereo_to_mono`]: downmix any number of interleaved channels to mono.
//! 2. [`resample`]: convert from any source rate to any target rate.
//!
//! The resampler uses linear interpolation: fast enough for real-time use,
//! not band-limited.

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input slice is returned as an owned `Vec`.
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use speech_session::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Number of output samples [`resample`] produces: `floor(len × target / source)`.
pub fn output_len(input_len: usize, source_rate: u32, target_rate: u32) -> usize {
    if source_rate == target_rate {
        return input_len;
    }
    if source_rate == 0 {
        return 0;
    }
    (input_len as u64 * target_rate as u64 / source_rate as u64) as usize
}

/// Resample mono `samples` from `source_rate` Hz to `target_rate` Hz using
/// linear interpolation.
///
/// * Equal rates return the input unchanged.
/// * Output sample `i` sits at source position `i / ratio`; the upper
///   neighbour is clamped to the last input sample.
///
/// # Example
///
/// ```rust
/// use speech_session::audio::resample;
///
/// let hi = vec![0.5_f32; 480];
/// let lo = resample(&hi, 48_000, 16_000);
/// assert_eq!(lo.len(), 160);
/// ```
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }

    let out_len = output_len(samples.len(), source_rate, target_rate);
    if samples.is_empty() || out_len == 0 {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx0 = (src_pos as usize).min(last);
            let idx1 = (idx0 + 1).min(last);
            let frac = src_pos - idx0 as f64;
            (samples[idx0] as f64 * (1.0 - frac) + samples[idx1] as f64 * frac) as f32
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- stereo_to_mono ----------------------------------------------------

    #[test]
    fn stereo_to_mono_already_mono() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(stereo_to_mono(&input, 1), input);
    }

    #[test]
    fn stereo_to_mono_two_channel() {
        let out = stereo_to_mono(&[1.0_f32, -1.0, 0.5, 0.5], 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stereo_to_mono_zero_channels() {
        assert!(stereo_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    // ---- resample ----------------------------------------------------------

    #[test]
    fn equal_rates_are_identity() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        for rate in [8_000, 16_000, 22_050, 44_100, 48_000] {
            assert_eq!(resample(&input, rate, rate), input);
        }
    }

    #[test]
    fn empty_input() {
        assert!(resample(&[], 48_000, 16_000).is_empty());
    }

    #[test]
    fn length_law_holds_within_one_sample() {
        let cases = [
            (22_050, 22_050u32, 16_000u32),
            (44_100, 44_100, 16_000),
            (480, 48_000, 16_000),
            (80, 8_000, 16_000),
            (1_234, 11_025, 22_050),
            (999, 16_000, 22_050),
        ];
        for (len, from, to) in cases {
            let out = resample(&vec![0.0_f32; len], from, to);
            let expected = (len as f64 * to as f64 / from as f64).round() as usize;
            assert!(
                out.len().abs_diff(expected) <= 1,
                "{len} @ {from} → {to}: expected ~{expected}, got {}",
                out.len()
            );
        }
    }

    #[test]
    fn one_second_at_22050_becomes_16000() {
        let out = resample(&vec![0.1_f32; 22_050], 22_050, 16_000);
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn constant_signal_preserves_amplitude() {
        let out = resample(&vec![0.5_f32; 441], 44_100, 16_000);
        assert!(out.iter().all(|s| (s - 0.5).abs() < 1e-5));
    }

    #[test]
    fn upsampling_interpolates_midpoints() {
        let out = resample(&[0.0_f32, 1.0], 8_000, 16_000);
        assert_eq!(out.len(), 4);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
        // upper neighbour clamped to the last input sample
        assert!((out[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_source_rate_yields_nothing() {
        assert!(resample(&[0.1, 0.2], 0, 16_000).is_empty());
    }
}
