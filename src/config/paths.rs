//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\speech-session\
//!   macOS:   ~/Library/Application Support/speech-session/
//!   Linux:   ~/.config/speech-session/
//!
//! Data dir (models and voices):
//!   Windows: %LOCALAPPDATA%\speech-session\
//!   macOS:   ~/Library/Application Support/speech-session/
//!   Linux:   ~/.local/share/speech-session/

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for Whisper GGML model files.
    pub models_dir: PathBuf,
    /// Directory for synthesis voices (`<voice>.onnx` + `<voice>.onnx.json`).
    pub voices_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "speech-session";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        Self::with_roots(config_dir, &data_dir)
    }

    /// Lay out the same structure under explicit roots.
    pub fn with_roots(config_dir: PathBuf, data_dir: &Path) -> Self {
        Self {
            settings_file: config_dir.join("settings.toml"),
            config_dir,
            models_dir: data_dir.join("models"),
            voices_dir: data_dir.join("voices"),
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
