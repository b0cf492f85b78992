//! Configuration for both engine kinds.
//!
//! Provides `SttConfig` and `TtsConfig` (the values each session's `init`
//! takes), `SpeechConfig` bundling both with TOML persistence via
//! `SpeechConfig::load` / `SpeechConfig::save`, and `AppPaths` for
//! cross-platform data directories.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{SpeechConfig, SttConfig, TtsConfig};
