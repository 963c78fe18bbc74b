//! Configuration types and pipeline constants

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sample rate of reference and generated audio
pub const SAMPLE_RATE: u32 = 24_000;

/// Samples per mel frame
pub const HOP_LENGTH: usize = 256;

/// Mel frames per second of audio (93.75)
pub const FRAMES_PER_SEC: f64 = SAMPLE_RATE as f64 / HOP_LENGTH as f64;

/// Loudness that quiet reference clips are raised to
pub const TARGET_RMS: f32 = 0.1;

/// Transcript of the bundled default reference clip
pub const DEFAULT_REFERENCE_TEXT: &str = "Some call me nature, others call me mother nature.";

/// File name of the bundled default reference clip
pub const DEFAULT_REFERENCE_FILE: &str = "test_en_1_ref_short.wav";

/// Which text normalization capability to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextNormalizerKind {
    /// Pinyin conversion in the Python bridge worker
    #[default]
    Bridge,
    /// Per-character split, no external dependency
    Native,
}

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the Hugging Face cache for checkpoints
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Model used when a request does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Vocoder checkpoint: local directory or Hugging Face repo id
    #[serde(default = "default_vocoder")]
    pub vocoder: String,

    /// Reference clip used when the caller supplies none
    #[serde(default = "default_reference")]
    pub default_reference: PathBuf,

    /// Python interpreter for the bridge worker
    #[serde(default = "default_python_cmd")]
    pub python_cmd: String,

    /// Bridge worker script
    #[serde(default = "default_bridge_script")]
    pub bridge_script: PathBuf,

    /// Fetch missing checkpoints from the hub
    #[serde(default = "default_allow_download")]
    pub allow_download: bool,

    #[serde(default)]
    pub text_normalizer: TextNormalizerKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            default_model: default_model(),
            vocoder: default_vocoder(),
            default_reference: default_reference(),
            python_cmd: default_python_cmd(),
            bridge_script: default_bridge_script(),
            allow_download: default_allow_download(),
            text_normalizer: TextNormalizerKind::default(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("f5tts")
}

fn default_models_dir() -> PathBuf {
    data_dir().join("models")
}

fn default_model() -> String {
    "f5-tts".to_string()
}

fn default_vocoder() -> String {
    "./models/vocos-mel-24khz".to_string()
}

fn default_reference() -> PathBuf {
    data_dir().join("assets").join(DEFAULT_REFERENCE_FILE)
}

fn default_python_cmd() -> String {
    "python3".to_string()
}

fn default_bridge_script() -> PathBuf {
    PathBuf::from("scripts/f5_tts_bridge.py")
}

fn default_allow_download() -> bool {
    true
}
