//! One STT session and one TTS session managed together.

use crate::config::SpeechConfig;
use crate::error::SpeechError;
use crate::stt::{SttLoader, SttSession, WhisperLoader};
use crate::tts::{TtsLoader, TtsSession};

/// Both engine kinds, each behind its own lock.
#[derive(Debug)]
pub struct SpeechEngines {
    pub stt: SttSession,
    pub tts: TtsSession,
}

impl SpeechEngines {
    /// Whisper for transcription, `tts_loader` for synthesis.
    pub fn new(tts_loader: impl TtsLoader + 'static) -> Self {
        Self::with_loaders(WhisperLoader, tts_loader)
    }

    pub fn with_loaders(stt_loader: impl SttLoader + 'static, tts_loader: impl TtsLoader + 'static) -> Self {
        Self {
            stt: SttSession::with_loader(stt_loader),
            tts: TtsSession::new(tts_loader),
        }
    }

    /// Initialise both sessions from `config`.
    ///
    /// Both inits are attempted; the first failure is returned.
    pub fn init(&self, config: &SpeechConfig) -> Result<(), SpeechError> {
        let stt = self.stt.init(config.stt.clone());
        let tts = self.tts.init(config.tts.clone());
        stt.and(tts)
    }

    /// Release both engines.  Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.stt.shutdown();
        self.tts.shutdown();
    }
}

impl Drop for SpeechEngines {
    fn drop(&mut self) {
        self.shutdown();
    }
}
