//! Where model and vocoder checkpoints come from

use std::fmt;
use std::path::{Path, PathBuf};

/// What a checkpoint is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Speech,
    Vocoder,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Speech => write!(f, "speech model"),
            ModelKind::Vocoder => write!(f, "vocoder"),
        }
    }
}

/// Short names for the published checkpoints
const ALIASES: &[(&str, &str)] = &[
    ("f5-tts", "lucasnewman/f5-tts-mlx"),
    ("vocos-mel-24khz", "lucasnewman/vocos-mel-24khz-mlx"),
];

/// A resolved checkpoint location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A directory on disk holding the checkpoint
    Local(PathBuf),
    /// A Hugging Face Hub repository
    Hub {
        repo_id: String,
        required: Vec<&'static str>,
        optional: Vec<&'static str>,
    },
}

impl ModelSource {
    /// Interpret a model name: a directory path, a known alias, or a repo id
    pub fn resolve(name: &str, kind: ModelKind) -> Self {
        let path = Path::new(name);
        if path.is_dir() || Self::is_path_like(name) {
            return ModelSource::Local(path.to_path_buf());
        }

        let repo_id = ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, repo)| repo.to_string())
            .unwrap_or_else(|| name.to_string());

        let (required, optional) = match kind {
            ModelKind::Speech => (vec!["model.safetensors"], vec!["config.json", "vocab.txt"]),
            ModelKind::Vocoder => (vec!["model.safetensors"], vec!["config.yaml"]),
        };

        ModelSource::Hub {
            repo_id,
            required,
            optional,
        }
    }

    /// Whether `name` looks like a filesystem path rather than a repo id
    pub fn is_path_like(name: &str) -> bool {
        name.starts_with('.')
            || name.starts_with('/')
            || name.starts_with('~')
            || name.matches('/').count() > 1
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Local(path) => write!(f, "{}", path.display()),
            ModelSource::Hub { repo_id, .. } => write!(f, "hf://{}", repo_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_alias_resolves_to_repo() {
        match ModelSource::resolve("f5-tts", ModelKind::Speech) {
            ModelSource::Hub {
                repo_id, required, ..
            } => {
                assert_eq!(repo_id, "lucasnewman/f5-tts-mlx");
                assert_eq!(required, vec!["model.safetensors"]);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_unknown_name_is_repo_id() {
        let source = ModelSource::resolve("someone/custom-f5", ModelKind::Speech);
        assert_eq!(source.to_string(), "hf://someone/custom-f5");
    }

    #[test]
    fn test_existing_directory_is_local() {
        let temp_dir = TempDir::new().unwrap();
        let name = temp_dir.path().to_string_lossy().to_string();
        assert_eq!(
            ModelSource::resolve(&name, ModelKind::Vocoder),
            ModelSource::Local(temp_dir.path().to_path_buf())
        );
    }

    #[test]
    fn test_missing_path_stays_local() {
        assert_eq!(
            ModelSource::resolve("./models/vocos-mel-24khz", ModelKind::Vocoder),
            ModelSource::Local(PathBuf::from("./models/vocos-mel-24khz"))
        );
    }

    #[test]
    fn test_path_like_names() {
        assert!(ModelSource::is_path_like("models/vocos/mel"));
        assert!(ModelSource::is_path_like("./models"));
        assert!(!ModelSource::is_path_like("lucasnewman/f5-tts-mlx"));
        assert!(!ModelSource::is_path_like("f5-tts"));
    }
}
