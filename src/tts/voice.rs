//! Piper voice manifest (`<voice>.onnx.json`) and the settings derived from
//! it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::TtsConfig;
use crate::error::SpeechError;

// ---------------------------------------------------------------------------
// VoiceManifest
// ---------------------------------------------------------------------------

/// The subset of a Piper voice manifest the session reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoiceManifest {
    pub audio: AudioSection,
    #[serde(default)]
    pub espeak: Option<EspeakSection>,
    #[serde(default)]
    pub inference: InferenceSection,
    #[serde(default = "one")]
    pub num_speakers: u32,
    #[serde(default)]
    pub speaker_id_map: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioSection {
    pub sample_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EspeakSection {
    pub voice: String,
}

/// Voice defaults for the synthesis scales.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InferenceSection {
    pub noise_scale: f32,
    pub length_scale: f32,
    pub noise_w: f32,
}

impl Default for InferenceSection {
    fn default() -> Self {
        Self {
            noise_scale: 0.667,
            length_scale: 1.0,
            noise_w: 0.8,
        }
    }
}

fn one() -> u32 {
    1
}

impl VoiceManifest {
    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SpeechError> {
        serde_json::from_str(json)
            .map_err(|e| SpeechError::ModelLoad(format!("invalid voice manifest: {e}")))
    }

    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, SpeechError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SpeechError::ModelLoad(format!("voice manifest {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Look up a named speaker.
    pub fn speaker_id(&self, name: &str) -> Option<u32> {
        self.speaker_id_map.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// VoiceSettings
// ---------------------------------------------------------------------------

/// Per-voice values handed to the synthesis engine when it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    /// `None` selects the voice's default speaker.
    pub speaker_id: Option<u32>,
    /// Phoneme duration multiplier; below 1.0 speaks faster.
    pub length_scale: f32,
    pub noise_scale: f32,
    pub noise_w: f32,
    pub sentence_silence_secs: f32,
    /// Requested output rate.
    pub sample_rate: u32,
}

impl VoiceSettings {
    /// Combine the session config with the voice's own defaults.
    ///
    /// A natural speech rate keeps the voice's tuned length scale; any other
    /// rate uses `1 / speech_rate`.
    pub fn resolve(config: &TtsConfig, manifest: &VoiceManifest) -> Result<Self, SpeechError> {
        if let Some(id) = config.speaker_id {
            if id >= manifest.num_speakers.max(1) {
                return Err(SpeechError::InvalidConfig(format!(
                    "speaker {id} out of range: voice has {} speaker(s)",
                    manifest.num_speakers
                )));
            }
        }

        let length_scale = if (config.speech_rate - 1.0).abs() < f32::EPSILON {
            manifest.inference.length_scale
        } else {
            config.length_scale()
        };

        Ok(Self {
            speaker_id: config.speaker_id,
            length_scale,
            noise_scale: manifest.inference.noise_scale,
            noise_w: manifest.inference.noise_w,
            sentence_silence_secs: config.sentence_silence_secs,
            sample_rate: config.sample_rate,
        })
    }
}
