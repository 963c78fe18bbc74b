//! Reference clip loading

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::decode::decode_audio;
use super::level::LevelNormalizer;
use crate::config::{DEFAULT_REFERENCE_TEXT, SAMPLE_RATE};
use crate::error::{Error, Result};

/// A reference recording supplied by the caller, always paired with what it says
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAudio {
    pub path: PathBuf,
    pub transcript: String,
}

impl ReferenceAudio {
    pub fn new(path: impl Into<PathBuf>, transcript: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            transcript: transcript.into(),
        }
    }
}

/// Mono reference audio at the pipeline sample rate plus its transcript
#[derive(Debug, Clone)]
pub struct ReferenceClip {
    samples: Vec<f32>,
    sample_rate: u32,
    duration_seconds: f64,
    transcript: String,
}

impl ReferenceClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, transcript: impl Into<String>) -> Self {
        let duration_seconds = samples.len() as f64 / sample_rate as f64;
        Self {
            samples,
            sample_rate,
            duration_seconds,
            transcript: transcript.into(),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Raise the clip to the normalizer's target loudness, returning the gain used
    pub fn normalize_level(&mut self, normalizer: &LevelNormalizer) -> Result<f32> {
        normalizer.normalize(&mut self.samples)
    }
}

/// Second source for the bundled clip, used when its file is not on disk
pub trait ReferenceAsset: Send + Sync {
    /// Encoded audio bytes of the clip
    fn read(&self) -> Result<Vec<u8>>;
}

/// Loads reference clips from disk or from the bundled default asset
#[derive(Clone)]
pub struct AudioLoader {
    default_reference: PathBuf,
    fallback: Option<Arc<dyn ReferenceAsset>>,
}

impl AudioLoader {
    pub fn new(default_reference: impl Into<PathBuf>) -> Self {
        Self {
            default_reference: default_reference.into(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn ReferenceAsset>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Load the caller's reference, or the bundled clip when there is none
    pub fn load(&self, reference: Option<&ReferenceAudio>) -> Result<ReferenceClip> {
        let clip = match reference {
            Some(reference) => self.load_file(&reference.path, &reference.transcript)?,
            None => self.load_default()?,
        };

        info!(
            "Got reference audio with duration: {:.2} seconds",
            clip.duration_seconds()
        );
        Ok(clip)
    }

    /// Load the bundled clip with its known transcript
    pub fn load_default(&self) -> Result<ReferenceClip> {
        let path = &self.default_reference;
        debug!("Loading bundled reference clip from {:?}", path);

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => self.read_fallback(path, e)?,
        };
        let audio = decode_audio(bytes, extension(path)).map_err(|e| {
            Error::ResourceMissing(format!("bundled reference clip {:?} is unreadable: {}", path, e))
        })?;

        check_sample_rate(audio.sample_rate)?;
        check_not_empty(&audio.samples, path)?;
        Ok(ReferenceClip::new(
            audio.samples,
            audio.sample_rate,
            DEFAULT_REFERENCE_TEXT,
        ))
    }

    fn read_fallback(&self, path: &Path, err: std::io::Error) -> Result<Vec<u8>> {
        let fallback = self.fallback.as_ref().ok_or_else(|| {
            Error::ResourceMissing(format!("bundled reference clip {:?}: {}", path, err))
        })?;

        debug!("{:?} unavailable ({}), asking the fallback source", path, err);
        fallback.read().map_err(|e| {
            Error::ResourceMissing(format!(
                "bundled reference clip {:?}: {}; fallback failed: {}",
                path, err, e
            ))
        })
    }

    /// Load a reference recording from `path`
    pub fn load_file(&self, path: &Path, transcript: &str) -> Result<ReferenceClip> {
        debug!("Loading reference audio from {:?}", path);

        let bytes = std::fs::read(path)?;
        let audio = decode_audio(bytes, extension(path))?;

        check_sample_rate(audio.sample_rate)?;
        check_not_empty(&audio.samples, path)?;
        Ok(ReferenceClip::new(audio.samples, audio.sample_rate, transcript))
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

fn check_sample_rate(sample_rate: u32) -> Result<()> {
    if sample_rate != SAMPLE_RATE {
        return Err(Error::InvalidInput(format!(
            "Reference audio must have a sample rate of 24kHz, got {} Hz",
            sample_rate
        )));
    }
    Ok(())
}

fn check_not_empty(samples: &[f32], path: &Path) -> Result<()> {
    if samples.is_empty() {
        return Err(Error::InvalidInput(format!(
            "Reference audio {:?} contains no samples",
            path
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ref.wav");
        write_wav(&path, 24000, &vec![0.2; 48000]);

        let loader = AudioLoader::new(temp_dir.path().join("missing.wav"));
        let clip = loader
            .load(Some(&ReferenceAudio::new(&path, "hello world")))
            .unwrap();

        assert_eq!(clip.len(), 48000);
        assert_eq!(clip.sample_rate(), 24000);
        assert_eq!(clip.duration_seconds(), 2.0);
        assert_eq!(clip.transcript(), "hello world");
    }

    #[test]
    fn test_wrong_sample_rate_is_invalid_input() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ref16k.wav");
        write_wav(&path, 16000, &vec![0.2; 16000]);

        let loader = AudioLoader::new(temp_dir.path().join("missing.wav"));
        let err = loader.load_file(&path, "hello").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "got {err:?}");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let loader = AudioLoader::new(temp_dir.path().join("missing.wav"));
        let err = loader
            .load_file(&temp_dir.path().join("nope.wav"), "hello")
            .unwrap_err();
        assert!(matches!(err, Error::IoError(_)), "got {err:?}");
    }

    #[test]
    fn test_missing_default_is_resource_missing() {
        let temp_dir = TempDir::new().unwrap();
        let loader = AudioLoader::new(temp_dir.path().join("missing.wav"));
        let err = loader.load(None).unwrap_err();
        assert!(matches!(err, Error::ResourceMissing(_)), "got {err:?}");
    }

    #[test]
    fn test_corrupt_default_is_resource_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("default.wav");
        std::fs::write(&path, b"RIFF but not really").unwrap();

        let err = AudioLoader::new(&path).load(None).unwrap_err();
        assert!(matches!(err, Error::ResourceMissing(_)), "got {err:?}");
    }

    struct StaticAsset(Option<Vec<u8>>);

    impl ReferenceAsset for StaticAsset {
        fn read(&self) -> Result<Vec<u8>> {
            self.0
                .clone()
                .ok_or_else(|| Error::InferenceError("no asset".to_string()))
        }
    }

    #[test]
    fn test_default_file_wins_over_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("default.wav");
        write_wav(&path, 24000, &vec![0.1; 2400]);

        let clip = AudioLoader::new(&path)
            .with_fallback(Arc::new(StaticAsset(None)))
            .load(None)
            .unwrap();
        assert_eq!(clip.len(), 2400);
    }

    #[test]
    fn test_missing_default_uses_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("packaged.wav");
        write_wav(&source, 24000, &vec![0.3; 4800]);
        let bytes = std::fs::read(&source).unwrap();

        let clip = AudioLoader::new(temp_dir.path().join("missing.wav"))
            .with_fallback(Arc::new(StaticAsset(Some(bytes))))
            .load(None)
            .unwrap();
        assert_eq!(clip.len(), 4800);
        assert_eq!(clip.transcript(), DEFAULT_REFERENCE_TEXT);
    }

    #[test]
    fn test_missing_default_and_failed_fallback() {
        let temp_dir = TempDir::new().unwrap();
        let err = AudioLoader::new(temp_dir.path().join("missing.wav"))
            .with_fallback(Arc::new(StaticAsset(None)))
            .load(None)
            .unwrap_err();
        assert!(matches!(err, Error::ResourceMissing(_)), "got {err:?}");
    }

    #[test]
    fn test_default_uses_known_transcript() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("default.wav");
        write_wav(&path, 24000, &vec![0.1; 2400]);

        let clip = AudioLoader::new(&path).load(None).unwrap();
        assert_eq!(clip.transcript(), DEFAULT_REFERENCE_TEXT);
        assert_eq!(clip.len(), 2400);
    }
}
