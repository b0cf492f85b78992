//! Text-to-speech: the engine seam, voice manifests, and the session.
//!
//! ```text
//! init(TtsConfig) ─▶ check files ─▶ VoiceManifest ─▶ VoiceSettings ─▶ TtsLoader ─▶ Box<dyn TtsBackend>
//!
//! synthesize(text)          ─▶ SynthesisResult
//! synthesize_to_file(text)  ─▶ WAV on disk
//! synthesize_chunks(text)   ─▶ SynthesisStream ─▶ SynthesisSink
//! ```

pub mod engine;
pub mod session;
pub mod voice;

pub use engine::{TtsBackend, TtsLoader};
pub use session::{SynthesisResult, TtsSession};
pub use voice::{VoiceManifest, VoiceSettings};
