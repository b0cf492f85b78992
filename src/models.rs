//! Model registry: Whisper GGML file names and Piper voice file pairs.
//!
//! [`WhisperModelInfo::parse`] understands the whisper.cpp naming scheme
//! `ggml-<size>[.en][-q5_1|-q8_0].bin`.  [`ModelPaths`] resolves model and
//! voice files under the application's data directories.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::AppPaths;

/// Where whisper.cpp publishes its converted GGML files.
pub const WHISPER_DOWNLOAD_BASE: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

// ---------------------------------------------------------------------------
// ModelSize / Quantization
// ---------------------------------------------------------------------------

/// Capacity tier of a Whisper model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    LargeV1,
    LargeV2,
    LargeV3,
    LargeV3Turbo,
}

impl ModelSize {
    /// Every tier, smallest first.
    pub const ALL: [ModelSize; 8] = [
        ModelSize::Tiny,
        ModelSize::Base,
        ModelSize::Small,
        ModelSize::Medium,
        ModelSize::LargeV1,
        ModelSize::LargeV2,
        ModelSize::LargeV3,
        ModelSize::LargeV3Turbo,
    ];

    /// Tag used in file names.
    pub fn tag(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::LargeV1 => "large-v1",
            ModelSize::LargeV2 => "large-v2",
            ModelSize::LargeV3 => "large-v3",
            ModelSize::LargeV3Turbo => "large-v3-turbo",
        }
    }

    /// Approximate size of the unquantized file in bytes.
    pub fn approx_bytes(&self) -> u64 {
        match self {
            ModelSize::Tiny => 77_691_713,
            ModelSize::Base => 147_951_465,
            ModelSize::Small => 487_601_617,
            ModelSize::Medium => 1_533_774_081,
            ModelSize::LargeV1 | ModelSize::LargeV2 | ModelSize::LargeV3 => 3_094_623_201,
            ModelSize::LargeV3Turbo => 1_622_089_793,
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.tag() == tag)
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Weight quantization of a GGML file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantization {
    Q5_1,
    Q8_0,
}

impl Quantization {
    pub fn tag(&self) -> &'static str {
        match self {
            Quantization::Q5_1 => "q5_1",
            Quantization::Q8_0 => "q8_0",
        }
    }

    /// Fraction of the unquantized size.
    fn size_factor(&self) -> f64 {
        match self {
            Quantization::Q5_1 => 0.45,
            Quantization::Q8_0 => 0.65,
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        [Quantization::Q5_1, Quantization::Q8_0]
            .into_iter()
            .find(|q| q.tag() == tag)
    }
}

// ---------------------------------------------------------------------------
// WhisperModelInfo
// ---------------------------------------------------------------------------

/// Metadata derived from a Whisper GGML file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhisperModelInfo {
    pub size: ModelSize,
    /// `.en` variant.
    pub english_only: bool,
    pub quantization: Option<Quantization>,
}

impl WhisperModelInfo {
    pub fn new(size: ModelSize, english_only: bool, quantization: Option<Quantization>) -> Self {
        Self {
            size,
            english_only,
            quantization,
        }
    }

    /// Parse `ggml-<size>[.en][-q5_1|-q8_0].bin`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_prefix("ggml-")?.strip_suffix(".bin")?;

        let (stem, quantization) = match stem.rsplit_once('-') {
            Some((rest, tag)) => match Quantization::from_tag(tag) {
                Some(q) => (rest, Some(q)),
                None => (stem, None),
            },
            None => (stem, None),
        };

        let (stem, english_only) = match stem.strip_suffix(".en") {
            Some(rest) => (rest, true),
            None => (stem, false),
        };

        let size = ModelSize::from_tag(stem)?;
        Some(Self::new(size, english_only, quantization))
    }

    /// Canonical file name.
    pub fn file_name(&self) -> String {
        let mut name = format!("ggml-{}", self.size.tag());
        if self.english_only {
            name.push_str(".en");
        }
        if let Some(q) = self.quantization {
            name.push('-');
            name.push_str(q.tag());
        }
        name.push_str(".bin");
        name
    }

    /// Approximate download size in bytes.
    pub fn approx_bytes(&self) -> u64 {
        let base = self.size.approx_bytes();
        match self.quantization {
            Some(q) => (base as f64 * q.size_factor()) as u64,
            None => base,
        }
    }

    pub fn download_url(&self) -> String {
        format!("{WHISPER_DOWNLOAD_BASE}/{}", self.file_name())
    }
}

// ---------------------------------------------------------------------------
// VoiceFiles
// ---------------------------------------------------------------------------

/// A Piper voice: `<voice>.onnx` plus its `<voice>.onnx.json` manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceFiles {
    pub model: PathBuf,
    pub config: PathBuf,
}

impl VoiceFiles {
    /// Files for `voice_id` inside `dir`.
    pub fn in_dir(dir: &Path, voice_id: &str) -> Self {
        Self {
            model: dir.join(format!("{voice_id}.onnx")),
            config: dir.join(format!("{voice_id}.onnx.json")),
        }
    }

    /// Both files present.
    pub fn exists(&self) -> bool {
        self.model.is_file() && self.config.is_file()
    }
}

// ---------------------------------------------------------------------------
// ModelPaths
// ---------------------------------------------------------------------------

/// Resolves the on-disk location of model and voice files from [`AppPaths`].
///
/// ```rust,no_run
/// use speech_session::config::AppPaths;
/// use speech_session::models::ModelPaths;
///
/// let paths = ModelPaths::from_app_paths(&AppPaths::new());
/// for (path, info) in paths.list_local_models() {
///     println!("{} ({})", path.display(), info.size);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// Directory that contains (or will contain) GGML `.bin` files.
    pub models_dir: PathBuf,
    /// Directory that contains Piper voices.
    pub voices_dir: PathBuf,
}

impl ModelPaths {
    /// Build a [`ModelPaths`] from the application's [`AppPaths`].
    pub fn from_app_paths(app_paths: &AppPaths) -> Self {
        Self {
            models_dir: app_paths.models_dir.clone(),
            voices_dir: app_paths.voices_dir.clone(),
        }
    }

    /// Construct directly from explicit directories.
    pub fn new(models_dir: impl Into<PathBuf>, voices_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            voices_dir: voices_dir.into(),
        }
    }

    /// Full path to the GGML file for `model`.
    pub fn model_path(&self, model: &WhisperModelInfo) -> PathBuf {
        self.models_dir.join(model.file_name())
    }

    /// Returns `true` if the model file exists on disk.
    pub fn is_available(&self, model: &WhisperModelInfo) -> bool {
        self.model_path(model).is_file()
    }

    /// Every recognised GGML file in the models directory, sorted by path.
    ///
    /// A missing directory yields an empty list.
    pub fn list_local_models(&self) -> Vec<(PathBuf, WhisperModelInfo)> {
        let Ok(entries) = std::fs::read_dir(&self.models_dir) else {
            return Vec::new();
        };
        let mut found: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let info = WhisperModelInfo::parse(name.to_str()?)?;
                Some((entry.path(), info))
            })
            .collect();
        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
    }

    /// Files for the voice named `voice_id`.
    pub fn voice(&self, voice_id: &str) -> VoiceFiles {
        VoiceFiles::in_dir(&self.voices_dir, voice_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_and_english_only() {
        let base = WhisperModelInfo::parse("ggml-base.bin").unwrap();
        assert_eq!(base, WhisperModelInfo::new(ModelSize::Base, false, None));

        let tiny_en = WhisperModelInfo::parse("ggml-tiny.en.bin").unwrap();
        assert!(tiny_en.english_only);
        assert_eq!(tiny_en.size, ModelSize::Tiny);
    }

    #[test]
    fn parse_quantized_and_turbo() {
        let q = WhisperModelInfo::parse("ggml-small.en-q5_1.bin").unwrap();
        assert_eq!(q, WhisperModelInfo::new(ModelSize::Small, true, Some(Quantization::Q5_1)));

        let turbo = WhisperModelInfo::parse("ggml-large-v3-turbo-q8_0.bin").unwrap();
        assert_eq!(turbo.size, ModelSize::LargeV3Turbo);
        assert_eq!(turbo.quantization, Some(Quantization::Q8_0));

        let v3 = WhisperModelInfo::parse("ggml-large-v3.bin").unwrap();
        assert_eq!(v3.size, ModelSize::LargeV3);
    }

    #[test]
    fn parse_rejects_unknown_names() {
        for name in ["base.bin", "ggml-huge.bin", "ggml-base.onnx", "ggml-base-q4_0.bin", ""] {
            assert!(WhisperModelInfo::parse(name).is_none(), "{name} should not parse");
        }
    }

    #[test]
    fn file_name_round_trips() {
        for size in ModelSize::ALL {
            for english_only in [false, true] {
                for quantization in [None, Some(Quantization::Q5_1), Some(Quantization::Q8_0)] {
                    let info = WhisperModelInfo::new(size, english_only, quantization);
                    assert_eq!(WhisperModelInfo::parse(&info.file_name()), Some(info));
                }
            }
        }
    }

    #[test]
    fn approx_bytes_scales_with_quantization() {
        let plain = WhisperModelInfo::new(ModelSize::Base, false, None);
        assert_eq!(plain.approx_bytes(), 147_951_465);

        let q5 = WhisperModelInfo::new(ModelSize::Base, false, Some(Quantization::Q5_1));
        assert_eq!(q5.approx_bytes(), (147_951_465_f64 * 0.45) as u64);
    }

    #[test]
    fn download_url_points_at_whisper_cpp() {
        let info = WhisperModelInfo::parse("ggml-medium.en.bin").unwrap();
        assert_eq!(
            info.download_url(),
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.en.bin"
        );
    }

    #[test]
    fn list_local_models_finds_only_ggml_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        for name in ["ggml-base.en.bin", "ggml-tiny-q5_1.bin", "notes.txt", "ggml-bogus.bin"] {
            std::fs::write(dir.path().join(name), b"x").expect("write");
        }

        let paths = ModelPaths::new(dir.path(), dir.path());
        let found = paths.list_local_models();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].1.size, ModelSize::Base);
        assert!(paths.is_available(&found[1].1));
    }

    #[test]
    fn missing_models_dir_is_empty() {
        let paths = ModelPaths::new("/nonexistent/models", "/nonexistent/voices");
        assert!(paths.list_local_models().is_empty());
        assert!(!paths.is_available(&WhisperModelInfo::new(ModelSize::Tiny, false, None)));
    }

    #[test]
    fn voice_files_need_both_halves() {
        let dir = tempfile::tempdir().expect("temp dir");
        let paths = ModelPaths::new(dir.path(), dir.path());
        let voice = paths.voice("en_US-lessac-medium");

        assert!(voice.model.ends_with("en_US-lessac-medium.onnx"));
        assert!(voice.config.ends_with("en_US-lessac-medium.onnx.json"));

        std::fs::write(&voice.model, b"onnx").expect("write");
        assert!(!voice.exists());
        std::fs::write(&voice.config, b"{}").expect("write");
        assert!(voice.exists());
    }
}
