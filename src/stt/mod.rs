//! Speech-to-text: the engine seam, the Whisper backend, and the session.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SttSession                            │
//! │                                                              │
//! │  init(SttConfig) ──▶ SttLoader ──▶ Box<dyn SttBackend>       │
//! │                                         │                    │
//! │  transcribe_file ─▶ wav::read_file ─▶ to_mono_at(16 kHz) ─┐  │
//! │  transcribe(buf) ──────────────────────────────────────────┤  │
//! │                                                           ▼  │
//! │                              VadDetector ─▶ backend.transcribe│
//! │                                                │             │
//! │                       TranscriptionResult ◀────┴─▶ Stream    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use speech_session::config::SttConfig;
//! use speech_session::stt::SttSession;
//!
//! let session = SttSession::new();
//! session
//!     .init(SttConfig::with_model("models/ggml-base.en.bin"))
//!     .expect("model not found");
//!
//! // audio: 16 kHz, mono, f32 PCM
//! let audio: Vec<f32> = vec![0.0; 16_000];
//! let text = session.transcribe(&audio).unwrap();
//! println!("{text}");
//! ```

pub mod engine;
pub mod session;
pub mod transcribe;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use engine::{SttBackend, SttLoader, WhisperBackend, WhisperLoader};
pub use session::SttSession;
pub use transcribe::{audio_ctx_for, Segment, TranscriptionResult, WHISPER_SAMPLE_RATE};
