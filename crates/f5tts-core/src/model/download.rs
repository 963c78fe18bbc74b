//! Locating checkpoints on disk and fetching them from the Hugging Face Hub

use hf_hub::api::sync::ApiBuilder;
use hf_hub::Cache;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::info::{ModelKind, ModelSource};

/// Resolves model names to checkpoint directories
#[derive(Debug, Clone)]
pub struct ModelDownloader {
    models_dir: PathBuf,
    allow_download: bool,
}

impl ModelDownloader {
    pub fn new(models_dir: PathBuf, allow_download: bool) -> Self {
        Self {
            models_dir,
            allow_download,
        }
    }

    /// Directory holding the checkpoint for `name`, downloading it if allowed
    pub fn locate(&self, name: &str, kind: ModelKind) -> Result<PathBuf> {
        match ModelSource::resolve(name, kind) {
            ModelSource::Local(path) => {
                if !path.is_dir() {
                    return Err(Error::ResourceMissing(format!(
                        "{} checkpoint directory {:?} not found",
                        kind, path
                    )));
                }
                Ok(path)
            }
            ModelSource::Hub {
                repo_id,
                required,
                optional,
            } => self.locate_hub(&repo_id, kind, &required, &optional),
        }
    }

    fn locate_hub(
        &self,
        repo_id: &str,
        kind: ModelKind,
        required: &[&str],
        optional: &[&str],
    ) -> Result<PathBuf> {
        let mut snapshot_dir = None;

        for file in required {
            let path = match self.cached_file(repo_id, file) {
                Some(path) => path,
                None => self.download_file(repo_id, kind, file)?,
            };
            snapshot_dir = snapshot_dir.or_else(|| path.parent().map(Path::to_path_buf));
        }

        for file in optional {
            if self.cached_file(repo_id, file).is_some() || !self.allow_download {
                continue;
            }
            if let Err(e) = self.download_file(repo_id, kind, file) {
                debug!("Optional file {} of {} not fetched: {}", file, repo_id, e);
            }
        }

        snapshot_dir.ok_or_else(|| {
            Error::ResourceMissing(format!("{} {} has no checkpoint files", kind, repo_id))
        })
    }

    fn cached_file(&self, repo_id: &str, file: &str) -> Option<PathBuf> {
        Cache::new(self.models_dir.clone())
            .model(repo_id.to_string())
            .get(file)
    }

    fn download_file(&self, repo_id: &str, kind: ModelKind, file: &str) -> Result<PathBuf> {
        if !self.allow_download {
            return Err(Error::ResourceMissing(format!(
                "{} {} is not downloaded ({} missing) and downloads are disabled",
                kind, repo_id, file
            )));
        }

        info!("Downloading {}/{} into {:?}", repo_id, file, self.models_dir);
        std::fs::create_dir_all(&self.models_dir)?;

        let api = ApiBuilder::new()
            .with_cache_dir(self.models_dir.clone())
            .with_progress(true)
            .build()?;
        api.model(repo_id.to_string()).get(file).map_err(|e| {
            warn!("Download of {}/{} failed: {}", repo_id, file, e);
            Error::DownloadError(format!("{}/{}: {}", repo_id, file, e))
        })
    }
}
