//! Transcription engine seam and the Whisper implementation.
//!
//! # Overview
//!
//! [`SttLoader`] builds an engine from an [`SttConfig`]; the session calls it
//! from `init` while holding the STT lock.  [`SttBackend`] is the loaded
//! engine: it takes 16 kHz mono f32 audio and returns timed segments.
//!
//! [`WhisperLoader`] / [`WhisperBackend`] are the production implementation
//! wrapping a `whisper_rs::WhisperContext`.

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::config::SttConfig;
use crate::error::SpeechError;
use crate::stt::transcribe::{audio_ctx_for, Segment};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A loaded transcription engine.
///
/// # Contract
///
/// - `audio` is **16 kHz, mono, f32** PCM.
/// - Segments are returned in engine order with timestamps relative to the
///   start of `audio`.
pub trait SttBackend: Send {
    fn transcribe(&mut self, audio: &[f32]) -> Result<Vec<Segment>, SpeechError>;
}

/// Builds a [`SttBackend`] from a validated config.
pub trait SttLoader: Send + Sync {
    fn load(&self, config: &SttConfig) -> Result<Box<dyn SttBackend>, SpeechError>;
}

// Compile-time assertion: both traits must be object-safe.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SttBackend>, _: Box<dyn SttLoader>) {}
};

// ---------------------------------------------------------------------------
// WhisperLoader
// ---------------------------------------------------------------------------

/// Loads GGML models through whisper-rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhisperLoader;

impl SttLoader for WhisperLoader {
    fn load(&self, config: &SttConfig) -> Result<Box<dyn SttBackend>, SpeechError> {
        WhisperBackend::load(config).map(|b| Box::new(b) as Box<dyn SttBackend>)
    }
}

// ---------------------------------------------------------------------------
// WhisperBackend
// ---------------------------------------------------------------------------

/// Production transcription engine wrapping a `whisper_rs::WhisperContext`.
///
/// A new `WhisperState` is created for every call.
pub struct WhisperBackend {
    ctx: WhisperContext,
    config: SttConfig,
}

impl std::fmt::Debug for WhisperBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperBackend")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send as declared by whisper-rs; the model weights
// are read-only after loading and every call builds its own state.
unsafe impl Send for WhisperBackend {}

impl WhisperBackend {
    /// Load the GGML model named by `config.model_path`.
    ///
    /// # Errors
    ///
    /// [`SpeechError::ModelLoad`] when the file is missing, the path is not
    /// UTF-8, or whisper-rs rejects the file.
    pub fn load(config: &SttConfig) -> Result<Self, SpeechError> {
        let path = config.model_path.as_path();

        if !path.exists() {
            return Err(SpeechError::ModelLoad(format!(
                "model not found: {}",
                path.display()
            )));
        }

        let path_str = path.to_str().ok_or_else(|| {
            SpeechError::ModelLoad(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(config.use_gpu);

        log::info!(target: "speech_session::stt", "loading whisper model {}", path.display());
        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| SpeechError::ModelLoad(e.to_string()))?;

        Ok(Self {
            ctx,
            config: config.clone(),
        })
    }

    fn full_params(&self, n_samples: usize) -> FullParams<'_, '_> {
        let mut fp = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        // `auto` leaves detection to the model.
        let lang: Option<&str> = if self.config.language == "auto" {
            None
        } else {
            Some(self.config.language.as_str())
        };
        fp.set_language(lang);
        fp.set_translate(self.config.translate);
        fp.set_n_threads(self.config.max_threads as i32);
        fp.set_single_segment(self.config.single_segment);
        fp.set_no_context(self.config.no_context);
        fp.set_audio_ctx(audio_ctx_for(n_samples));

        fp.set_print_special(false);
        fp.set_print_progress(false);
        fp.set_print_realtime(false);
        fp.set_print_timestamps(false);
        fp
    }
}

impl SttBackend for WhisperBackend {
    fn transcribe(&mut self, audio: &[f32]) -> Result<Vec<Segment>, SpeechError> {
        let fp = self.full_params(audio.len());

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SpeechError::Inference(format!("whisper state: {e}")))?;

        state
            .full(fp, audio)
            .map_err(|e| SpeechError::Inference(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SpeechError::Inference(e.to_string()))?;

        let mut segments = Vec::with_capacity(n_segments.max(0) as usize);
        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| SpeechError::Inference(format!("segment {i}: {e}")))?;

            // Timestamps are in centiseconds → multiply by 10 for ms.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as u64 * 10;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as u64 * 10;

            segments.push(Segment {
                text,
                start_ms: t0,
                end_ms: t1,
            });
        }

        Ok(segments)
    }
}

// ---------------------------------------------------------------------------
// MockStt  (test-only)
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::mock::MockSttLoader;
    use super::*;

    #[test]
    fn load_missing_model_returns_model_load() {
        let config = SttConfig::with_model("/nonexistent/ggml-base.bin");
        let result = WhisperLoader.load(&config);
        assert!(
            matches!(result, Err(SpeechError::ModelLoad(ref m)) if m.contains("/nonexistent/ggml-base.bin")),
            "expected ModelLoad"
        );
    }

    #[test]
    fn load_garbage_model_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ggml-broken.bin");
        std::fs::write(&path, b"not a model").expect("write");

        let result = WhisperBackend::load(&SttConfig {
            use_gpu: false,
            ..SttConfig::with_model(&path)
        });
        assert!(matches!(result, Err(SpeechError::ModelLoad(_))));
    }

    #[test]
    fn box_dyn_backend_compiles() {
        let loader = MockSttLoader::with_segments(vec![Segment {
            text: "ok".into(),
            start_ms: 0,
            end_ms: 10,
        }]);
        let mut engine: Box<dyn SttBackend> = loader.load(&SttConfig::default()).unwrap();
        let segments = engine.transcribe(&[0.0; 160]).unwrap();
        assert_eq!(segments[0].text, "ok");
        assert_eq!(loader.last_input_len(), 160);
    }

    #[test]
    fn mock_release_is_counted_on_drop() {
        let loader = MockSttLoader::with_segments(Vec::new());
        let engine = loader.load(&SttConfig::default()).unwrap();
        assert_eq!(loader.probe.loads(), 1);
        drop(engine);
        assert_eq!(loader.probe.releases(), 1);
    }
}
