//! The synthesis session: one voice, one lock, a token per operation.

use std::path::Path;

use crate::audio::wav;
use crate::cancel::CancellationToken;
use crate::config::TtsConfig;
use crate::error::SpeechError;
use crate::latency::{LatencyTrace, Stage};
use crate::session::{EngineKind, EngineSlot, Loaded, SessionState};
use crate::stream::{self, StreamOutcome, SynthesisSink, SynthesisStream};
use crate::tts::engine::{TtsBackend, TtsLoader};
use crate::tts::voice::{VoiceManifest, VoiceSettings};

const LOG_TARGET: &str = "speech_session::tts";

type TtsSlot = EngineSlot<Box<dyn TtsBackend>, TtsConfig>;

// ---------------------------------------------------------------------------
// SynthesisResult
// ---------------------------------------------------------------------------

/// PCM produced by one synthesis call, with throughput metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Mono 16-bit samples.
    pub samples: Vec<i16>,
    /// Rate the engine produced `samples` at.
    pub sample_rate: u32,
    /// Duration of `samples` in seconds.
    pub audio_seconds: f32,
    /// Wall time over audio time; below 1.0 is faster than real time.
    pub real_time_factor: Option<f32>,
}

impl SynthesisResult {
    fn new(samples: Vec<i16>, sample_rate: u32, trace: &LatencyTrace) -> Self {
        let audio_ms = samples.len() as u64 * 1000 / sample_rate.max(1) as u64;
        Self {
            audio_seconds: samples.len() as f32 / sample_rate.max(1) as f32,
            real_time_factor: trace.real_time_factor(audio_ms),
            samples,
            sample_rate,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        (self.audio_seconds * 1000.0).round() as u64
    }
}

// ---------------------------------------------------------------------------
// TtsSession
// ---------------------------------------------------------------------------

/// Owns at most one synthesis engine and serialises every call on it.
pub struct TtsSession {
    slot: TtsSlot,
    loader: Box<dyn TtsLoader>,
}

impl TtsSession {
    pub fn new(loader: impl TtsLoader + 'static) -> Self {
        Self {
            slot: EngineSlot::new(EngineKind::Tts),
            loader: Box::new(loader),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Release any loaded voice, check the voice files, then load a new one.
    ///
    /// A missing model, manifest or phoneme data directory fails with
    /// [`SpeechError::ModelLoad`] and leaves the session uninitialized.
    pub fn init(&self, config: TtsConfig) -> Result<(), SpeechError> {
        self.slot.replace(config, |config| {
            config.validate()?;
            require(&config.model_path, "voice model", Path::is_file)?;
            require(&config.config_path, "voice manifest", Path::is_file)?;
            require(&config.espeak_data_path, "phoneme data", Path::is_dir)?;

            let manifest = VoiceManifest::load(&config.config_path)?;
            let settings = VoiceSettings::resolve(config, &manifest)?;
            log::debug!(target: LOG_TARGET, "voice settings: {settings:?}");
            self.loader.load(config, &manifest, &settings)
        })
    }

    /// Release the voice.  A no-op when nothing is loaded.
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

    /// Config of the loaded voice.
    pub fn config(&self) -> Option<TtsConfig> {
        self.slot.map_config(TtsConfig::clone)
    }

    /// Cancel the most recently started synthesis.
    pub fn cancel(&self) {
        self.slot.cancel();
    }


    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Synthesize `text` into PCM.
    pub fn synthesize(&self, text: &str) -> Result<SynthesisResult, SpeechError> {
        self.slot.with_ready(|loaded, token| {
            let mut trace = LatencyTrace::start("synthesize");
            let samples = render(loaded, text, token, &mut trace)?;
            Ok(finish(samples, loaded.engine.sample_rate(), trace))
        })
    }

    /// Synthesize `text` and write it to `path` as a mono 16-bit WAV at the
    /// engine's sample rate.
    pub fn synthesize_to_file(
        &self,
        text: &str,
        path: impl AsRef<Path>,
    ) -> Result<SynthesisResult, SpeechError> {
        let path = path.as_ref();
        self.slot.with_ready(|loaded, token| {
            let mut trace = LatencyTrace::start("synthesize_to_file");
            let samples = render(loaded, text, token, &mut trace)?;
            let rate = loaded.engine.sample_rate();
            wav::write_file(path, &samples, rate)?;
            log::debug!(target: LOG_TARGET, "wrote {} sample(s) to {}", samples.len(), path.display());
            Ok(finish(samples, rate, trace))
        })
    }

    /// Synthesize `text`, then return a stream of fixed-size chunks over the
    /// result.
    ///
    /// The stream is consumed after the TTS lock is released; it honours
    /// [`cancel`](Self::cancel) before every chunk.
    pub fn synthesize_chunks(&self, text: &str) -> Result<SynthesisStream, SpeechError> {
        self.slot.with_ready(|loaded, token| {
            let mut trace = LatencyTrace::start("synthesize_stream");
            let samples = render(loaded, text, token, &mut trace)?;
            let rate = loaded.engine.sample_rate();
            trace.mark(Stage::ResultsCollected);
            trace.report(samples.len() as u64 * 1000 / rate.max(1) as u64);
            Ok(SynthesisStream::new(samples, rate, token.clone()))
        })
    }

    /// Synthesize and push the audio into `sink` chunk by chunk.
    ///
    /// A clean cancellation ends silently after the chunks already sent.
    /// `sink` runs after the TTS lock is released.
    pub fn synthesize_stream<S>(&self, text: &str, sink: &mut S) -> StreamOutcome
    where
        S: SynthesisSink + ?Sized,
    {
        match self.synthesize_chunks(text) {
            Ok(chunks) => stream::deliver_synthesis(chunks, sink),
            Err(SpeechError::Cancelled) => {
                log::info!(target: LOG_TARGET, "synthesis cancelled before delivery");
                StreamOutcome::Cancelled
            }
            Err(e) => {
                log::error!(target: LOG_TARGET, "streamed synthesis failed: {e}");
                sink.on_error(&e);
                StreamOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for TtsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsSession")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn require(path: &Path, what: &str, check: fn(&Path) -> bool) -> Result<(), SpeechError> {
    if check(path) {
        Ok(())
    } else {
        Err(SpeechError::ModelLoad(format!("{what} not found: {}", path.display())))
    }
}

/// Run the engine.  Failures observed after a cancel request surface as
/// [`SpeechError::Cancelled`].
fn render(
    loaded: &mut Loaded<Box<dyn TtsBackend>, TtsConfig>,
    text: &str,
    token: &CancellationToken,
    trace: &mut LatencyTrace,
) -> Result<Vec<i16>, SpeechError> {
    trace.mark(Stage::InputAcquired);
    trace.mark(Stage::PreInference);

    let samples = match loaded.engine.synthesize(text) {
        Ok(samples) => samples,
        Err(_) if token.is_cancelled() => return Err(SpeechError::Cancelled),
        Err(e) => {
            log::error!(target: LOG_TARGET, "synthesis failed: {e}");
            return Err(e);
        }
    };
    trace.mark(Stage::PostInference);

    if samples.is_empty() {
        if token.is_cancelled() {
            return Err(SpeechError::Cancelled);
        }
        log::error!(target: LOG_TARGET, "synthesis produced no audio for {} char(s)", text.len());
        return Err(SpeechError::Inference("synthesis produced no audio".into()));
    }
    Ok(samples)
}

fn finish(samples: Vec<i16>, sample_rate: u32, mut trace: LatencyTrace) -> SynthesisResult {
    trace.mark(Stage::ResultsCollected);
    let result = SynthesisResult::new(samples, sample_rate, &trace);
    trace.report(result.duration_ms());
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::engine::mock::MockTtsLoader;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "audio": { "sample_rate": 22050 },
        "inference": { "noise_scale": 0.667, "length_scale": 1.0, "noise_w": 0.8 },
        "num_speakers": 2
    }"#;

    fn voice_dir() -> (TempDir, TtsConfig) {
        let dir = tempfile::tempdir().expect("temp dir");
        let model_path = dir.path().join("test-voice.onnx");
        let config_path = dir.path().join("test-voice.onnx.json");
        let espeak_data_path = dir.path().join("espeak-ng-data");
        std::fs::write(&model_path, b"onnx").expect("write model");
        std::fs::write(&config_path, MANIFEST).expect("write manifest");
        std::fs::create_dir(&espeak_data_path).expect("create data dir");

        let config = TtsConfig {
            model_path,
            config_path,
            espeak_data_path,
            ..TtsConfig::default()
        };
        (dir, config)
    }

    fn ready_session(loader: &MockTtsLoader) -> (TempDir, TtsSession) {
        let _ = env_logger::builder().is_test(true).try_init();
        let (dir, config) = voice_dir();
        let session = TtsSession::new(loader.clone());
        session.init(config).expect("init");
        (dir, session)
    }

    #[derive(Default)]
    struct Recorder {
        chunks: Vec<usize>,
        completed: usize,
        errors: Vec<String>,
    }

    impl SynthesisSink for Recorder {
        fn on_chunk(&mut self, samples: &[i16]) {
            self.chunks.push(samples.len());
        }
        fn on_complete(&mut self) {
            self.completed += 1;
        }
        fn on_error(&mut self, error: &SpeechError) {
            self.errors.push(error.to_string());
        }
    }

    // --- lifecycle ---

    #[test]
    fn uninitialized_session_rejects_work_without_calling_engine() {
        let loader = MockTtsLoader::new(100);
        let session = TtsSession::new(loader.clone());

        let err = session.synthesize("hello").unwrap_err();
        assert_eq!(err.to_string(), "TTS engine not ready");
        assert_eq!(loader.probe.calls(), 0);
    }

    #[test]
    fn missing_phoneme_data_fails_init() {
        let (_dir, mut config) = voice_dir();
        config.espeak_data_path = config.espeak_data_path.join("missing");
        let loader = MockTtsLoader::new(100);
        let session = TtsSession::new(loader.clone());

        assert!(matches!(session.init(config), Err(SpeechError::ModelLoad(_))));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(loader.probe.loads(), 0);
    }

    #[test]
    fn missing_model_fails_init() {
        let (_dir, mut config) = voice_dir();
        config.model_path = config.model_path.with_extension("missing");
        let session = TtsSession::new(MockTtsLoader::new(100));

        let err = session.init(config).unwrap_err();
        assert!(err.to_string().contains("voice model not found"));
    }

    #[test]
    fn invalid_rate_fails_init() {
        let (_dir, mut config) = voice_dir();
        config.speech_rate = 0.0;
        let session = TtsSession::new(MockTtsLoader::new(100));
        assert!(matches!(session.init(config), Err(SpeechError::InvalidConfig(_))));
    }

    #[test]
    fn reinit_releases_previous_voice_once() {
        let loader = MockTtsLoader::new(100);
        let (_dir, session) = ready_session(&loader);
        let config = session.config().expect("config");
        session.cancel();

        session.init(config).unwrap();

        assert_eq!(loader.probe.loads(), 2);
        assert_eq!(loader.probe.releases(), 1);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let loader = MockTtsLoader::new(100);
        let (_dir, session) = ready_session(&loader);

        session.shutdown();
        session.shutdown();
        assert_eq!(loader.probe.releases(), 1);
        assert!(!session.is_ready());
    }

    #[test]
    fn speech_rate_reaches_engine_as_length_scale() {
        let (_dir, mut config) = voice_dir();
        config.speech_rate = 2.0;
        config.speaker_id = TtsConfig::speaker_from_index(1);
        let loader = MockTtsLoader::new(100);
        TtsSession::new(loader.clone()).init(config).unwrap();

        let settings = loader.last_settings().expect("settings");
        assert!((settings.length_scale - 0.5).abs() < 1e-6);
        assert_eq!(settings.speaker_id, Some(1));
        assert_eq!(settings.sample_rate, 22_050);
    }

    // --- synthesis ---

    #[test]
    fn synthesize_reports_metrics() {
        let loader = MockTtsLoader::new(2_205);
        let (_dir, session) = ready_session(&loader);

        let result = session.synthesize("ten chars!").unwrap();
        assert_eq!(result.samples.len(), 22_050);
        assert_eq!(result.sample_rate, 22_050);
        assert!((result.audio_seconds - 1.0).abs() < 1e-6);
        assert_eq!(result.duration_ms(), 1_000);
        assert!(result.real_time_factor.is_some());
    }

    #[test]
    fn empty_output_is_inference_failure() {
        let loader = MockTtsLoader::new(100);
        let (_dir, session) = ready_session(&loader);

        let err = session.synthesize("").unwrap_err();
        assert!(matches!(err, SpeechError::Inference(ref m) if m.contains("no audio")));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn engine_failure_keeps_session_ready() {
        let mut loader = MockTtsLoader::new(100);
        loader.fail_inference = true;
        let (_dir, session) = ready_session(&loader);

        assert!(matches!(session.synthesize("hi"), Err(SpeechError::Inference(_))));
        assert!(session.is_ready());
    }

    #[test]
    fn synthesize_to_file_writes_playable_wav() {
        let loader = MockTtsLoader::new(50);
        let (dir, session) = ready_session(&loader);
        let out = dir.path().join("out.wav");

        let result = session.synthesize_to_file("hello", &out).unwrap();

        let decoded = wav::read_file(&out).unwrap();
        assert_eq!(decoded.sample_rate, 22_050);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.to_pcm16(), result.samples);
    }

    #[test]
    fn synthesize_to_unwritable_path_is_io_error() {
        let loader = MockTtsLoader::new(50);
        let (_dir, session) = ready_session(&loader);

        let err = session
            .synthesize_to_file("hello", "/nonexistent/dir/out.wav")
            .unwrap_err();
        assert!(matches!(err, SpeechError::Io { .. }));
    }

    // --- streaming ---

    #[test]
    fn stream_chunks_then_completes() {
        let loader = MockTtsLoader::new(1_000);
        let (_dir, session) = ready_session(&loader);
        let mut sink = Recorder::default();

        let outcome = session.synthesize_stream("ten chars!", &mut sink);

        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(sink.chunks, vec![4096, 4096, 1808]);
        assert_eq!(sink.completed, 1);
        assert!(sink.errors.is_empty());
    }

    #[test]
    fn cancel_before_delivery_is_silent() {
        let loader = MockTtsLoader::new(1_000);
        let (_dir, session) = ready_session(&loader);

        let chunks = session.synthesize_chunks("ten chars!").unwrap();
        session.cancel();
        let mut sink = Recorder::default();

        assert_eq!(
            stream::deliver_synthesis(chunks, &mut sink),
            StreamOutcome::Cancelled
        );
        assert!(sink.chunks.is_empty());
        assert_eq!(sink.completed, 0);
        assert!(sink.errors.is_empty());
    }

    #[test]
    fn cancel_from_sink_stops_after_current_chunk() {
        struct CancelOnFirst<'a> {
            session: &'a TtsSession,
            chunks: usize,
            completed: bool,
        }

        impl SynthesisSink for CancelOnFirst<'_> {
            fn on_chunk(&mut self, _: &[i16]) {
                self.chunks += 1;
                self.session.cancel();
            }
            fn on_complete(&mut self) {
                self.completed = true;
            }
            fn on_error(&mut self, _: &SpeechError) {}
        }

        let loader = MockTtsLoader::new(1_000);
        let (_dir, session) = ready_session(&loader);
        let mut sink = CancelOnFirst {
            session: &session,
            chunks: 0,
            completed: false,
        };

        assert_eq!(
            session.synthesize_stream("ten chars!", &mut sink),
            StreamOutcome::Cancelled
        );
        assert_eq!(sink.chunks, 1);
        assert!(!sink.completed);
    }

    #[test]
    fn stream_failure_reports_error_once() {
        let loader = MockTtsLoader::new(100);
        let (_dir, session) = ready_session(&loader);
        let mut sink = Recorder::default();

        assert_eq!(session.synthesize_stream("", &mut sink), StreamOutcome::Failed);
        assert_eq!(sink.errors.len(), 1);
        assert!(sink.chunks.is_empty());
        assert_eq!(sink.completed, 0);
    }

    #[test]
    fn later_synthesis_keeps_cancel_of_pending_chunks() {
        let loader = MockTtsLoader::new(1_000);
        let (_dir, session) = ready_session(&loader);

        let mut chunks = session.synthesize_chunks("ten chars!").unwrap();
        assert!(chunks.next().is_some());

        session.cancel();
        session.synthesize("hi").unwrap();

        assert_eq!(chunks.by_ref().count(), 0);
        assert_eq!(chunks.outcome(), Some(StreamOutcome::Cancelled));
    }
}
