//! Synthesis engine seam.
//!
//! The voice model itself (phonemization plus the neural vocoder) lives
//! outside this crate.  A [`TtsLoader`] turns a validated [`TtsConfig`] and
//! its resolved [`VoiceSettings`] into a [`TtsBackend`], which maps text to
//! mono 16-bit PCM at its own sample rate.

use crate::config::TtsConfig;
use crate::error::SpeechError;
use crate::tts::voice::{VoiceManifest, VoiceSettings};

/// A loaded synthesis engine.
pub trait TtsBackend: Send {
    /// Synthesize `text` into mono 16-bit PCM.
    fn synthesize(&mut self, text: &str) -> Result<Vec<i16>, SpeechError>;

    /// Rate of the PCM returned by [`synthesize`](Self::synthesize).
    fn sample_rate(&self) -> u32;
}

/// Builds a [`TtsBackend`] once the session has checked every voice file.
pub trait TtsLoader: Send + Sync {
    fn load(
        &self,
        config: &TtsConfig,
        manifest: &VoiceManifest,
        settings: &VoiceSettings,
    ) -> Result<Box<dyn TtsBackend>, SpeechError>;
}

// Compile-time assertion: both traits must be object-safe.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TtsBackend>, _: Box<dyn TtsLoader>) {}
};

// ---------------------------------------------------------------------------
// MockTts  (test-only)
// ---------------------------------------------------------------------------
