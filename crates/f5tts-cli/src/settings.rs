//! Layered settings: defaults, then a TOML file, then `F5TTS_*` environment variables

use config::{Config, Environment, File, FileFormat};
use std::path::Path;

use f5tts_core::EngineConfig;

const DEFAULT_SETTINGS_FILE: &str = "f5tts.toml";
const ENV_PREFIX: &str = "F5TTS";

/// Load the engine configuration.
///
/// An explicitly named file must exist; the default `f5tts.toml` is optional.
pub fn load(path: Option<&Path>) -> Result<EngineConfig, config::ConfigError> {
    let (file, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_SETTINGS_FILE), false),
    };

    Config::builder()
        .add_source(File::from(file).format(FileFormat::Toml).required(required))
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use f5tts_core::TextNormalizerKind;
    use tempfile::TempDir;

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "default_model = \"local/f5\"\nallow_download = false\ntext_normalizer = \"native\"\n",
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.default_model, "local/f5");
        assert!(!config.allow_download);
        assert_eq!(config.text_normalizer, TextNormalizerKind::Native);
        assert_eq!(config.python_cmd, "python3");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(load(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
