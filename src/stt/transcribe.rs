//! Transcription result types and Whisper parameter helpers.

/// Sample rate every transcription engine consumes.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Upper bound on the encoder context Whisper accepts.
const MAX_AUDIO_CTX: usize = 1_500;

/// Encoder context size for a clip of `n_samples` at 16 kHz.
///
/// One context slot covers 20 ms (320 samples); short clips get a smaller
/// context so the encoder does not pad to the full 30 s window.
pub fn audio_ctx_for(n_samples: usize) -> i32 {
    let ctx = n_samples.div_ceil(320).min(MAX_AUDIO_CTX);
    ctx as i32
}

/// Audio duration of `n_samples` at the transcription rate.
pub fn duration_ms(n_samples: usize) -> u64 {
    n_samples as u64 * 1000 / WHISPER_SAMPLE_RATE as u64
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// The output of a completed transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionResult {
    /// Full concatenated transcript text (trimmed of leading/trailing
    /// whitespace).
    pub text: String,

    /// Individual time-aligned segments in engine order.
    pub segments: Vec<Segment>,

    /// Language tag the engine was configured with.
    pub language: String,

    /// Duration of the input audio, in milliseconds.
    pub duration_ms: u64,
}

impl TranscriptionResult {
    /// Aggregate `segments` into a result.
    pub fn from_segments(segments: Vec<Segment>, language: impl Into<String>, duration_ms: u64) -> Self {
        let text: String = segments.iter().map(|s| s.text.as_str()).collect();
        Self {
            text: text.trim().to_string(),
            segments,
            language: language.into(),
            duration_ms,
        }
    }
}

/// A single time-aligned text chunk produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment text (may include punctuation inserted by the engine).
    pub text: String,
    /// Segment start time in milliseconds from the start of the audio.
    pub start_ms: u64,
    /// Segment end time in milliseconds from the start of the audio.
    pub end_ms: u64,
}

impl Segment {
    pub(crate) fn shifted(mut self, offset_ms: u64) -> Self {
        self.start_ms += offset_ms;
        self.end_ms += offset_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_ctx_rounds_up_per_20ms() {
        assert_eq!(audio_ctx_for(0), 0);
        assert_eq!(audio_ctx_for(1), 1);
        assert_eq!(audio_ctx_for(320), 1);
        assert_eq!(audio_ctx_for(321), 2);
        assert_eq!(audio_ctx_for(16_000), 50);
    }

    #[test]
    fn audio_ctx_is_capped() {
        assert_eq!(audio_ctx_for(30 * 16_000), 1_500);
        assert_eq!(audio_ctx_for(120 * 16_000), 1_500);
    }

    #[test]
    fn one_second_is_one_thousand_ms() {
        assert_eq!(duration_ms(16_000), 1_000);
        assert_eq!(duration_ms(8_000), 500);
        assert_eq!(duration_ms(0), 0);
    }

    #[test]
    fn from_segments_concatenates_and_trims() {
        let result = TranscriptionResult::from_segments(
            vec![
                Segment { text: " Good".into(), start_ms: 0, end_ms: 300 },
                Segment { text: " morning.".into(), start_ms: 300, end_ms: 800 },
            ],
            "en",
            1_000,
        );
        assert_eq!(result.text, "Good morning.");
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.language, "en");
    }

    #[test]
    fn shifted_moves_both_bounds() {
        let seg = Segment { text: "x".into(), start_ms: 10, end_ms: 20 }.shifted(500);
        assert_eq!((seg.start_ms, seg.end_ms), (510, 520));
    }
}
