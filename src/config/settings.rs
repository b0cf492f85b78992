//! Engine configuration structs, defaults, validation and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to a session's
//! `init`.  A config is immutable once an engine is built from it; changing
//! it means calling `init` again.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::audio::DEFAULT_VAD_THRESHOLD;
use crate::error::SpeechError;

// ---------------------------------------------------------------------------
// SttConfig
// ---------------------------------------------------------------------------

/// Settings for the Whisper transcription engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Path to the GGML model file.
    pub model_path: PathBuf,
    /// Speech language as an ISO-639-1 code, or `"auto"` for Whisper's
    /// built-in language detection.
    pub language: String,
    /// Translate into English instead of transcribing.
    pub translate: bool,
    /// Worker threads handed to the engine.  Must be at least 1.
    pub max_threads: u32,
    /// Request GPU inference when the engine was built with it.
    pub use_gpu: bool,
    /// Trim leading and trailing silence before inference.
    pub use_vad: bool,
    /// Force a single output segment.
    pub single_segment: bool,
    /// Do not carry decoder context between calls.
    pub no_context: bool,
    /// RMS threshold for the voice-activity gate.
    pub vad_threshold: f32,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            language: "en".into(),
            translate: false,
            max_threads: 4,
            use_gpu: true,
            use_vad: true,
            single_segment: true,
            no_context: true,
            vad_threshold: DEFAULT_VAD_THRESHOLD,
        }
    }
}

impl SttConfig {
    /// Config for the model at `model_path` with every other field default.
    pub fn with_model(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Reject values outside their documented ranges.
    pub fn validate(&self) -> Result<(), SpeechError> {
        if self.max_threads < 1 {
            return Err(SpeechError::InvalidConfig(
                "max_threads must be at least 1".into(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(SpeechError::InvalidConfig("language must not be empty".into()));
        }
        if !(self.vad_threshold.is_finite() && self.vad_threshold >= 0.0) {
            return Err(SpeechError::InvalidConfig(format!(
                "vad_threshold must be a non-negative number, got {}",
                self.vad_threshold
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for the synthesis voice engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Path to the voice model (`<voice>.onnx`).
    pub model_path: PathBuf,
    /// Path to the voice manifest (`<voice>.onnx.json`).
    pub config_path: PathBuf,
    /// Directory holding the phoneme data the voice depends on.
    pub espeak_data_path: PathBuf,
    /// Speaker to use on multi-speaker voices; `None` selects the default.
    pub speaker_id: Option<u32>,
    /// Speech-rate multiplier.  1.0 is natural speed; must be positive.
    pub speech_rate: f32,
    /// Target output sample rate in Hz.
    pub sample_rate: u32,
    /// Silence inserted between sentences, in seconds.
    pub sentence_silence_secs: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("voices/en_US-lessac-medium.onnx"),
            config_path: PathBuf::from("voices/en_US-lessac-medium.onnx.json"),
            espeak_data_path: PathBuf::from("espeak-ng-data"),
            speaker_id: None,
            speech_rate: 1.0,
            sample_rate: 22_050,
            sentence_silence_secs: 0.2,
        }
    }
}

impl TtsConfig {
    /// Map a raw signed speaker index to a speaker selection: negative means
    /// the voice's default speaker.
    pub fn speaker_from_index(index: i32) -> Option<u32> {
        u32::try_from(index).ok()
    }

    /// Duration multiplier handed to the voice: `1 / speech_rate`.
    pub fn length_scale(&self) -> f32 {
        1.0 / self.speech_rate
    }

    /// Reject values outside their documented ranges.
    pub fn validate(&self) -> Result<(), SpeechError> {
        if !(self.speech_rate.is_finite() && self.speech_rate > 0.0) {
            return Err(SpeechError::InvalidConfig(format!(
                "speech_rate must be positive, got {}",
                self.speech_rate
            )));
        }
        if self.sample_rate == 0 {
            return Err(SpeechError::InvalidConfig("sample_rate must be non-zero".into()));
        }
        if !(self.sentence_silence_secs.is_finite() && self.sentence_silence_secs >= 0.0) {
            return Err(SpeechError::InvalidConfig(format!(
                "sentence_silence_secs must be non-negative, got {}",
                self.sentence_silence_secs
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig  (top-level)
// ---------------------------------------------------------------------------

/// Both engine configs, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use speech_session::config::SpeechConfig;
///
/// // Load (returns Default when file is missing)
/// let config = SpeechConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Transcription engine settings.
    pub stt: SttConfig,
    /// Synthesis engine settings.
    pub tts: TtsConfig,
}

impl SpeechConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(SpeechConfig::default())` when the file does not exist
    /// yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
