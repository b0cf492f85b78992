//! Command-line transcriber.
//!
//! ```text
//! speech-session <file.wav>...
//! ```
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`SpeechConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime.
//! 4. Load the Whisper model named in the config.
//! 5. Transcribe every file argument on the blocking pool, one at a time,
//!    printing each transcript.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use speech_session::{config::SpeechConfig, task, SttSession};

fn main() -> ExitCode {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        eprintln!("usage: speech-session <file.wav>...");
        return ExitCode::from(2);
    }

    // 2. Configuration
    let config = SpeechConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        SpeechConfig::default()
    });

    // 3. Tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    // 4. Engine
    let session = Arc::new(SttSession::new());
    if let Err(e) = session.init(config.stt.clone()) {
        log::error!("could not load {}: {e}", config.stt.model_path.display());
        return ExitCode::FAILURE;
    }

    // 5. Transcribe
    let failures = rt.block_on(async {
        let mut failures = 0usize;
        for path in files {
            match task::transcribe_file(Arc::clone(&session), path.clone()).await {
                Ok(result) => println!("{}: {}", path.display(), result.text),
                Err(e) => {
                    log::error!("{}: {e}", path.display());
                    failures += 1;
                }
            }
        }
        failures
    });

    session.shutdown();
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
