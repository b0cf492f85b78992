//! Audio plumbing: the WAV container codec, resampling and the voice gate.
//!
//! # Pipeline
//!
//! ```text
//! WAV bytes ─▶ wav::decode ─▶ AudioBuffer (interleaved, source rate)
//!           ─▶ into_mono ─▶ resample(→ 16 kHz) ─▶ VadDetector ─▶ engine
//!
//! engine PCM ─▶ wav::encode ─▶ WAV bytes (mono, 16-bit)
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use speech_session::audio::{wav, AudioBuffer};
//!
//! let bytes = wav::encode(&[0, 8_192, -8_192], 22_050);
//! let buf: AudioBuffer = wav::decode(&bytes).unwrap().to_mono_at(16_000);
//! assert_eq!(buf.sample_rate, 16_000);
//! ```

pub mod buffer;
pub mod resample;
pub mod vad;
pub mod wav;

pub use buffer::{AudioBuffer, PCM16_SCALE};
pub use resample::{output_len, resample, stereo_to_mono};
pub use vad::{VadDetector, DEFAULT_VAD_THRESHOLD};
