//! Audio session engine for a transcription model and a synthesis voice.
//!
//! Each engine kind lives in its own session ([`SttSession`], [`TtsSession`])
//! holding at most one loaded engine behind a mutex.  Each operation polls a
//! cooperative [`CancellationToken`] of its own.  Around the sessions sit the WAV codec, a linear
//! resampler, chunked streaming delivery and latency tracing.
//!
//! ```text
//! audio/    wav codec, resampler, voice-activity gate
//! session   lifecycle core shared by both kinds
//! stream    pull streams + push sinks, checked against the cancel token
//! stt/      Whisper backend and SttSession
//! tts/      voice manifests and TtsSession
//! latency   per-stage timing, real-time factor
//! task      tokio spawn_blocking adapters
//! ```

pub mod audio;
pub mod cancel;
pub mod config;
pub mod engines;
pub mod error;
pub mod latency;
pub mod models;
pub mod session;
pub mod stream;
pub mod stt;
pub mod task;
pub mod tts;

#[cfg(test)]
mod testing;

pub use cancel::CancellationToken;
pub use config::{SpeechConfig, SttConfig, TtsConfig};
pub use engines::SpeechEngines;
pub use error::{DecodeError, SpeechError};
pub use session::{EngineKind, SessionState};
pub use stream::{StreamOutcome, SynthesisSink, TranscriptionSink};
pub use stt::{SttSession, TranscriptionResult};
pub use tts::{SynthesisResult, TtsSession};
