//! Error taxonomy shared by every session operation.
//!
//! Failures from the native engines, the file system, and the WAV codec are
//! all converted into [`SpeechError`] at the boundary so nothing escapes as a
//! panic.  [`SpeechError::Cancelled`] is a terminal outcome rather than a
//! fault and is never logged as an error.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::EngineKind;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Reason a byte sequence could not be decoded as a RIFF/WAVE PCM container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The first four bytes are not `RIFF`.
    #[error("missing RIFF header")]
    MissingRiff,

    /// Bytes 8..12 are not `WAVE`.
    #[error("missing WAVE header")]
    MissingWave,

    /// A `data` chunk was reached before any `fmt ` chunk.
    #[error("missing fmt chunk")]
    MissingFormat,

    /// `fmt ` declares an audio format other than PCM (1).
    #[error("unsupported audio format {0} (only PCM is supported)")]
    UnsupportedFormat(u16),

    /// `fmt ` declares a bit depth other than 16.
    #[error("unsupported bit depth {0} (only 16-bit PCM is supported)")]
    UnsupportedBitDepth(u16),

    /// `fmt ` declares a sample rate of zero.
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(u32),

    /// `fmt ` declares zero channels.
    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u16),

    /// No `data` chunk was found.
    #[error("missing data chunk")]
    MissingData,

    /// A chunk header or the `fmt ` body ended before its declared size.
    #[error("truncated container")]
    Truncated,

    /// The `data` chunk holds no samples.
    #[error("audio payload is empty")]
    Empty,
}

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// All errors that can arise from a speech session.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// An operation was attempted before a successful `init`.
    #[error("{kind} engine not ready")]
    EngineNotReady { kind: EngineKind },

    /// The engine could not be constructed (missing model, missing auxiliary
    /// data, or the native loader rejected the files).
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// The input audio was malformed or unsupported.
    #[error("audio decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The engine returned an error status or produced no output.
    #[error("inference failed: {0}")]
    Inference(String),

    /// A file path could not be opened, read, or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is outside its documented range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operation was halted by a cancellation request.
    #[error("Cancelled")]
    Cancelled,
}

impl SpeechError {
    /// Build an [`SpeechError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for [`SpeechError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_converts_into_speech_error() {
        let err: SpeechError = DecodeError::MissingRiff.into();
        assert!(matches!(err, SpeechError::Decode(DecodeError::MissingRiff)));
        assert!(err.to_string().contains("RIFF"));
    }

    #[test]
    fn not_ready_names_the_engine_kind() {
        let err = SpeechError::EngineNotReady {
            kind: EngineKind::Tts,
        };
        assert_eq!(err.to_string(), "TTS engine not ready");
    }

    #[test]
    fn io_error_mentions_path() {
        let err = SpeechError::io(
            "/tmp/missing.wav",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing.wav"));
    }

    #[test]
    fn only_cancelled_is_cancelled() {
        assert!(SpeechError::Cancelled.is_cancelled());
        assert!(!SpeechError::Inference("x".into()).is_cancelled());
        assert_eq!(SpeechError::Cancelled.to_string(), "Cancelled");
    }
}
