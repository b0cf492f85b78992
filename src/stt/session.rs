//! The transcription session: one engine, one lock, a token per operation.

use std::path::Path;

use crate::audio::{wav, VadDetector};
use crate::config::SttConfig;
use crate::error::SpeechError;
use crate::latency::{LatencyTrace, Stage};
use crate::session::{EngineKind, EngineSlot, Loaded, SessionState};
use crate::stream::{self, StreamOutcome, TranscriptionSink, TranscriptionStream};
use crate::stt::engine::{SttBackend, SttLoader, WhisperLoader};
use crate::stt::transcribe::{self, Segment, TranscriptionResult, WHISPER_SAMPLE_RATE};

const LOG_TARGET: &str = "speech_session::stt";

type SttSlot = EngineSlot<Box<dyn SttBackend>, SttConfig>;

/// Owns at most one transcription engine and serialises every call on it.
///
/// ```rust,no_run
/// use speech_session::config::SttConfig;
/// use speech_session::stt::SttSession;
///
/// let session = SttSession::new();
/// session.init(SttConfig::with_model("models/ggml-base.en.bin"))?;
/// let text = session.transcribe_file("hello.wav")?;
/// println!("{text}");
/// # Ok::<(), speech_session::SpeechError>(())
/// ```
pub struct SttSession {
    slot: SttSlot,
    loader: Box<dyn SttLoader>,
}

impl SttSession {
    /// Session backed by whisper-rs.
    pub fn new() -> Self {
        Self::with_loader(WhisperLoader)
    }

    /// Session backed by a custom engine loader.
    pub fn with_loader(loader: impl SttLoader + 'static) -> Self {
        Self {
            slot: EngineSlot::new(EngineKind::Stt),
            loader: Box::new(loader),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Release any loaded engine, then load a new one from `config`.
    ///
    /// On failure the session is left uninitialized.
    pub fn init(&self, config: SttConfig) -> Result<(), SpeechError> {
        self.slot.replace(config, |config| {
            config.validate()?;
            self.loader.load(config)
        })
    }

    /// Release the engine.  A no-op when nothing is loaded.
    pub fn shutdown(&self) {
        self.slot.shutdown();
    }

    pub fn state(&self) -> SessionState {
        self.slot.state()
    }

    /// `true` while an engine is loaded, including while an operation is
    /// running on it ([`SessionState::Busy`]).  Never blocks.
    pub fn is_ready(&self) -> bool {
        self.slot.is_loaded()
    }

    /// Config of the loaded engine.
    pub fn config(&self) -> Option<SttConfig> {
        self.slot.map_config(SttConfig::clone)
    }

    /// Cancel the most recently started transcription.
    ///
    /// A stream returned by [`transcribe_segments`](Self::transcribe_segments)
    /// stays cancellable through [`TranscriptionStream::cancel_handle`] after
    /// later operations start.
    pub fn cancel(&self) {
        self.slot.cancel();
    }


    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Transcribe 16 kHz mono samples and return the text.
    pub fn transcribe(&self, samples: &[f32]) -> Result<String, SpeechError> {
        self.transcribe_detailed(samples).map(|r| r.text)
    }

    /// Transcribe 16 kHz mono samples into a [`TranscriptionResult`].
    pub fn transcribe_detailed(&self, samples: &[f32]) -> Result<TranscriptionResult, SpeechError> {
        self.slot.with_ready(|loaded, _| {
            let mut trace = LatencyTrace::start("transcribe");
            trace.mark(Stage::InputAcquired);
            collect(loaded, samples, trace)
        })
    }

    /// Read a WAV file, convert it to 16 kHz mono and return the text.
    pub fn transcribe_file(&self, path: impl AsRef<Path>) -> Result<String, SpeechError> {
        self.transcribe_file_detailed(path).map(|r| r.text)
    }

    /// Read a WAV file, convert it to 16 kHz mono and transcribe it.
    pub fn transcribe_file_detailed(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<TranscriptionResult, SpeechError> {
        let path = path.as_ref();
        self.slot.with_ready(|loaded, _| {
            let mut trace = LatencyTrace::start("transcribe_file");
            let audio = wav::read_file(path)?;
            log::debug!(
                target: LOG_TARGET,
                "{}: {} frame(s) @ {} Hz, {} channel(s)",
                path.display(),
                audio.frames(),
                audio.sample_rate,
                audio.channels
            );
            let audio = audio.to_mono_at(WHISPER_SAMPLE_RATE);
            trace.mark(Stage::InputAcquired);
            collect(loaded, &audio.samples, trace)
        })
    }

    /// Run the engine to completion, then return a stream replaying its
    /// segments.
    ///
    /// The stream is consumed after the STT lock is released; it honours
    /// [`cancel`](Self::cancel) before every segment.
    pub fn transcribe_segments(&self, samples: &[f32]) -> Result<TranscriptionStream, SpeechError> {
        self.slot.with_ready(|loaded, token| {
            let mut trace = LatencyTrace::start("transcribe_stream");
            trace.mark(Stage::InputAcquired);
            let segments = infer(loaded, samples, &mut trace)?;
            let duration_ms = transcribe::duration_ms(samples.len());
            trace.mark(Stage::ResultsCollected);
            trace.report(duration_ms);
            Ok(TranscriptionStream::new(
                segments,
                loaded.config.language.clone(),
                duration_ms,
                token.clone(),
            ))
        })
    }

    /// Transcribe and replay the segments into `sink`.
    ///
    /// Exactly one of `on_final` / `on_error` fires.  `sink` runs after the
    /// STT lock is released, so it may call back into this session.
    pub fn transcribe_stream<S>(&self, samples: &[f32], sink: &mut S) -> StreamOutcome
    where
        S: TranscriptionSink + ?Sized,
    {
        match self.transcribe_segments(samples) {
            Ok(replay) => stream::deliver_transcription(replay, sink),
            Err(e) => {
                log::error!(target: LOG_TARGET, "streamed transcription failed: {e}");
                sink.on_error(&e);
                StreamOutcome::Failed
            }
        }
    }
}

impl Default for SttSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SttSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SttSession")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Inference helpers (run under the STT lock)
// ---------------------------------------------------------------------------

fn collect(
    loaded: &mut Loaded<Box<dyn SttBackend>, SttConfig>,
    samples: &[f32],
    mut trace: LatencyTrace,
) -> Result<TranscriptionResult, SpeechError> {
    let segments = infer(loaded, samples, &mut trace)?;
    let duration_ms = transcribe::duration_ms(samples.len());
    let result =
        TranscriptionResult::from_segments(segments, loaded.config.language.clone(), duration_ms);
    trace.mark(Stage::ResultsCollected);
    trace.report(duration_ms);
    log::debug!(target: LOG_TARGET, "{} segment(s): {:?}", result.segments.len(), result.text);
    Ok(result)
}

/// Gate, run the engine, and map segment times back onto `samples`.
fn infer(
    loaded: &mut Loaded<Box<dyn SttBackend>, SttConfig>,
    samples: &[f32],
    trace: &mut LatencyTrace,
) -> Result<Vec<Segment>, SpeechError> {
    let (window, offset_ms) = if loaded.config.use_vad {
        match VadDetector::new(loaded.config.vad_threshold).speech_bounds(samples) {
            Some(range) => {
                let offset_ms = transcribe::duration_ms(range.start);
                (&samples[range], offset_ms)
            }
            None => {
                log::debug!(target: LOG_TARGET, "no speech detected; engine not invoked");
                trace.mark(Stage::PreInference);
                return Ok(Vec::new());
            }
        }
    } else {
        (samples, 0)
    };
    trace.mark(Stage::PreInference);

    let segments = loaded.engine.transcribe(window).map_err(|e| {
        log::error!(target: LOG_TARGET, "inference failed: {e}");
        e
    })?;
    trace.mark(Stage::PostInference);

    Ok(segments.into_iter().map(|s| s.shifted(offset_ms)).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
