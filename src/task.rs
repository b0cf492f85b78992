//! Async adapters over the blocking session calls.
//!
//! Inference and WAV I/O block for seconds at a time, so every adapter pushes
//! the call onto `tokio::task::spawn_blocking` and the async runtime never
//! stalls.  The sessions keep their own locking; an STT task and a TTS task
//! run concurrently, two STT tasks queue on the STT lock.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::SpeechError;
use crate::stt::{SttSession, TranscriptionResult};
use crate::tts::{SynthesisResult, TtsSession};

async fn run_blocking<T, F>(op: F) -> Result<T, SpeechError>
where
    F: FnOnce() -> Result<T, SpeechError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| SpeechError::Inference(format!("blocking task failed: {e}")))?
}

/// [`SttSession::transcribe`] on the blocking pool.
pub async fn transcribe(session: Arc<SttSession>, samples: Vec<f32>) -> Result<String, SpeechError> {
    run_blocking(move || session.transcribe(&samples)).await
}

/// [`SttSession::transcribe_file_detailed`] on the blocking pool.
pub async fn transcribe_file(
    session: Arc<SttSession>,
    path: PathBuf,
) -> Result<TranscriptionResult, SpeechError> {
    run_blocking(move || session.transcribe_file_detailed(&path)).await
}

/// [`TtsSession::synthesize`] on the blocking pool.
pub async fn synthesize(session: Arc<TtsSession>, text: String) -> Result<SynthesisResult, SpeechError> {
    run_blocking(move || session.synthesize(&text)).await
}

/// [`TtsSession::synthesize_to_file`] on the blocking pool.
pub async fn synthesize_to_file(
    session: Arc<TtsSession>,
    text: String,
    path: PathBuf,
) -> Result<SynthesisResult, SpeechError> {
    run_blocking(move || session.synthesize_to_file(&text, &path)).await
}
