//! Checkpoint validation from safetensors headers

use safetensors::SafeTensors;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// What was found in a checkpoint directory
#[derive(Debug, Clone)]
pub struct CheckpointSummary {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub tensor_count: usize,
    pub total_bytes: usize,
}

impl CheckpointSummary {
    /// Parse every safetensors file in `model_dir`.
    ///
    /// A directory without weights is [`Error::ResourceMissing`]; a file that
    /// does not parse is [`Error::CheckpointError`].
    pub fn inspect(model_dir: &Path) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(Error::ResourceMissing(format!(
                "checkpoint directory {:?} not found",
                model_dir
            )));
        }

        let files = Self::find_safetensor_files(model_dir)?;
        if files.is_empty() {
            return Err(Error::ResourceMissing(format!(
                "no .safetensors weights in {:?}",
                model_dir
            )));
        }

        let mut tensor_count = 0;
        let mut total_bytes = 0;
        for file_path in &files {
            debug!("Checking weights in {:?}", file_path);
            let data = std::fs::read(file_path)?;
            let tensors = SafeTensors::deserialize(&data).map_err(|e| {
                Error::CheckpointError(format!("{:?}: {}", file_path, e))
            })?;
            tensor_count += tensors.len();
            total_bytes += tensors
                .tensors()
                .iter()
                .map(|(_, view)| view.data().len())
                .sum::<usize>();
        }

        info!(
            "Checkpoint {:?}: {} tensors, {:.1} MB",
            model_dir,
            tensor_count,
            total_bytes as f64 / 1_000_000.0
        );

        Ok(Self {
            dir: model_dir.to_path_buf(),
            files,
            tensor_count,
            total_bytes,
        })
    }

    /// Find all safetensors files in directory
    fn find_safetensor_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path
                .extension()
                .map(|e| e == "safetensors")
                .unwrap_or(false)
            {
                files.push(path);
            }
        }

        // Sort to ensure consistent loading order
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetensors::tensor::{Dtype, TensorView};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_checkpoint(path: &Path) {
        let data: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let view = TensorView::new(Dtype::F32, vec![2, 2], &data).unwrap();
        let tensors: HashMap<String, TensorView<'_>> =
            HashMap::from([("proj.weight".to_string(), view)]);
        safetensors::serialize_to_file(tensors, &None, path).unwrap();
    }

    #[test]
    fn test_inspect_checkpoint() {
        let temp_dir = TempDir::new().unwrap();
        write_checkpoint(&temp_dir.path().join("model.safetensors"));
        std::fs::write(temp_dir.path().join("config.json"), "{}").unwrap();

        let summary = CheckpointSummary::inspect(temp_dir.path()).unwrap();
        assert_eq!(summary.files.len(), 1);
        assert_eq!(summary.tensor_count, 1);
        assert_eq!(summary.total_bytes, 16);
    }

    #[test]
    fn test_empty_directory_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let err = CheckpointSummary::inspect(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::ResourceMissing(_)));

        let err = CheckpointSummary::inspect(&temp_dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::ResourceMissing(_)));
    }

    #[test]
    fn test_corrupt_weights() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("model.safetensors"), b"garbage").unwrap();
        let err = CheckpointSummary::inspect(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::CheckpointError(_)));
    }
}
