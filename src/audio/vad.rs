//! Energy-based voice-activity gate.
//!
//! [`VadDetector`] locates the span between the first and last voiced frame
//! of a 16 kHz mono clip.  The transcription session uses it when
//! `use_vad` is set so leading/trailing silence never reaches the engine.
//!
//! Audio is split into 30 ms frames (480 samples @ 16 kHz).  A frame is
//! voiced when its RMS amplitude exceeds the threshold.

use std::ops::Range;

/// Default RMS threshold for a quiet room.
pub const DEFAULT_VAD_THRESHOLD: f32 = 0.01;

// ---------------------------------------------------------------------------
// VadDetector
// ---------------------------------------------------------------------------

/// Energy-based silence trimmer.
///
/// # Example
///
/// ```rust
/// use speech_session::audio::VadDetector;
///
/// let vad = VadDetector::new(0.01);
///
/// let mut audio = vec![0.0_f32; 480];
/// audio.extend(vec![0.5_f32; 480]);
/// audio.extend(vec![0.0_f32; 480]);
///
/// assert_eq!(vad.speech_bounds(&audio), Some(480..960));
/// ```
#[derive(Debug, Clone)]
pub struct VadDetector {
    rms_threshold: f32,
    frame_size: usize,
}

impl VadDetector {
    /// Create a detector with 30 ms frames at 16 kHz.
    pub fn new(rms_threshold: f32) -> Self {
        Self {
            rms_threshold,
            frame_size: 480,
        }
    }

    /// Create a detector with a custom frame size (clamped to at least 1).
    pub fn with_frame_size(rms_threshold: f32, frame_size: usize) -> Self {
        Self {
            rms_threshold,
            frame_size: frame_size.max(1),
        }
    }

    /// RMS threshold currently in use.
    pub fn threshold(&self) -> f32 {
        self.rms_threshold
    }

    fn is_voice_frame(&self, chunk: &[f32]) -> bool {
        if chunk.is_empty() {
            return false;
        }
        let mean_sq: f32 = chunk.iter().map(|s| s * s).sum::<f32>() / chunk.len() as f32;
        mean_sq.sqrt() > self.rms_threshold
    }

    /// Sample range from the first voiced frame to the end of the last one,
    /// or `None` when the whole clip is silent.
    pub fn speech_bounds(&self, audio: &[f32]) -> Option<Range<usize>> {
        let frame = self.frame_size;
        let voiced: Vec<usize> = audio
            .chunks(frame)
            .enumerate()
            .filter(|(_, chunk)| self.is_voice_frame(chunk))
            .map(|(i, _)| i)
            .collect();

        let first = *voiced.first()?;
        let last = *voiced.last()?;
        Some(first * frame..((last + 1) * frame).min(audio.len()))
    }

    /// Trim leading and trailing silence; an all-silent clip yields an empty
    /// slice.
    pub fn trim_silence<'a>(&self, audio: &'a [f32]) -> &'a [f32] {
        match self.speech_bounds(audio) {
            Some(range) => &audio[range],
            None => &audio[0..0],
        }
    }
}

impl Default for VadDetector {
    fn default() -> Self {
        Self::new(DEFAULT_VAD_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_signal(silent_pre: usize, voice: usize, silent_post: usize) -> Vec<f32> {
        let mut v = vec![0.0_f32; silent_pre];
        v.extend(vec![0.5_f32; voice]);
        v.extend(vec![0.0_f32; silent_post]);
        v
    }

    #[test]
    fn trims_leading_and_trailing_silence() {
        let audio = make_signal(480, 480, 480);
        assert_eq!(VadDetector::new(0.01).trim_silence(&audio).len(), 480);
    }

    #[test]
    fn all_silence_has_no_bounds() {
        let audio = vec![0.0_f32; 1_440];
        let vad = VadDetector::default();
        assert_eq!(vad.speech_bounds(&audio), None);
        assert!(vad.trim_silence(&audio).is_empty());
    }

    #[test]
    fn no_silence_returns_full_signal() {
        let audio = vec![0.5_f32; 1_000];
        assert_eq!(VadDetector::default().speech_bounds(&audio), Some(0..1_000));
    }

    #[test]
    fn empty_input_has_no_bounds() {
        assert_eq!(VadDetector::default().speech_bounds(&[]), None);
    }

    #[test]
    fn custom_frame_size() {
        let vad = VadDetector::with_frame_size(0.01, 160);
        let audio = make_signal(320, 160, 160);
        assert_eq!(vad.speech_bounds(&audio), Some(320..480));
    }

    #[test]
    fn zero_frame_size_is_clamped() {
        let vad = VadDetector::with_frame_size(0.01, 0);
        assert_eq!(vad.speech_bounds(&[0.0, 0.9, 0.0]), Some(1..2));
        assert!((vad.threshold() - 0.01).abs() < 1e-7);
    }
}
