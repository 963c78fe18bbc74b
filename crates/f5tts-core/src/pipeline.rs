//! Generation orchestrator: reference clip in, trimmed waveform out

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::audio::{AudioEncoder, AudioLoader, LevelNormalizer, ReferenceAudio};
use crate::config::{EngineConfig, TextNormalizerKind, SAMPLE_RATE};
use crate::duration::{DurationEstimator, DurationPlan};
use crate::error::{Error, Result};
use crate::inference::{BridgeProcess, BridgeReferenceAsset, BridgeTextNormalizer, SampleRequest};
use crate::model::{BridgeModelLoader, ModelDownloader, ModelRegistry};
use crate::text::{prompt_text, CharNormalizer, TextNormalizer};

pub const DEFAULT_MODEL: &str = "f5-tts";
pub const DEFAULT_OUTPUT: &str = "output.wav";

/// Parameters for one generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub generation_text: String,
    /// Seconds of new speech; estimated from the reference when absent
    pub duration_seconds: Option<f64>,
    pub model_name: String,
    /// Bundled default clip when absent
    pub reference: Option<ReferenceAudio>,
    pub cfg_strength: f64,
    pub sway_sampling_coef: f64,
    pub steps: usize,
    /// Only used by the duration heuristic
    pub speed: f64,
    pub seed: Option<u64>,
    pub output_path: PathBuf,
}

impl GenerationRequest {
    pub fn new(generation_text: impl Into<String>) -> Self {
        Self {
            generation_text: generation_text.into(),
            duration_seconds: None,
            model_name: DEFAULT_MODEL.to_string(),
            reference: None,
            cfg_strength: 2.0,
            sway_sampling_coef: -1.0,
            steps: 32,
            speed: 1.0,
            seed: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_reference(mut self, reference: ReferenceAudio) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_cfg_strength(mut self, cfg_strength: f64) -> Self {
        self.cfg_strength = cfg_strength;
        self
    }

    pub fn with_sway_sampling_coef(mut self, coef: f64) -> Self {
        self.sway_sampling_coef = coef;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Reject parameters the sampler cannot use
    pub fn validate(&self) -> Result<()> {
        if self.generation_text.trim().is_empty() {
            return Err(Error::InvalidInput("generation text is empty".to_string()));
        }
        if self.steps == 0 {
            return Err(Error::InvalidInput("steps must be at least 1".to_string()));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        if !self.cfg_strength.is_finite() || !self.sway_sampling_coef.is_finite() {
            return Err(Error::InvalidInput(
                "cfg strength and sway coefficient must be finite".to_string(),
            ));
        }
        if self.model_name.is_empty() {
            return Err(Error::InvalidInput("model name is empty".to_string()));
        }
        Ok(())
    }
}

/// Trimmed waveform of the new speech, before it is written anywhere
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub id: Uuid,
    pub samples: Vec<f32>,
    pub plan: DurationPlan,
    pub reference_duration_seconds: f64,
    pub elapsed: Duration,
}

impl GeneratedAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / SAMPLE_RATE as f64
    }
}

/// Summary of a generation whose output has been written
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub id: Uuid,
    pub frame_budget: usize,
    pub estimated_duration_seconds: f64,
    pub reference_duration_seconds: f64,
    pub generated_samples: usize,
    pub generated_duration_seconds: f64,
    pub elapsed: Duration,
    pub output_path: PathBuf,
}

/// Runs the full text-to-speech pipeline for one request at a time
pub struct GenerationOrchestrator {
    loader: AudioLoader,
    level: LevelNormalizer,
    estimator: DurationEstimator,
    text_normalizer: Arc<dyn TextNormalizer>,
    registry: Arc<ModelRegistry>,
    vocoder_name: String,
    encoder: AudioEncoder,
}

impl GenerationOrchestrator {
    pub fn new(
        loader: AudioLoader,
        text_normalizer: Arc<dyn TextNormalizer>,
        registry: Arc<ModelRegistry>,
        vocoder_name: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            level: LevelNormalizer::default(),
            estimator: DurationEstimator::default(),
            text_normalizer,
            registry,
            vocoder_name: vocoder_name.into(),
            encoder: AudioEncoder::new(SAMPLE_RATE, 1),
        }
    }

    /// Wire the pipeline to the Python bridge and the checkpoint cache
    pub fn from_config(config: &EngineConfig) -> Self {
        let bridge = Arc::new(BridgeProcess::new(
            config.python_cmd.clone(),
            config.bridge_script.clone(),
        ));
        let downloader = ModelDownloader::new(config.models_dir.clone(), config.allow_download);
        let registry = Arc::new(ModelRegistry::new(Box::new(BridgeModelLoader::new(
            downloader,
            bridge.clone(),
        ))));

        let text_normalizer: Arc<dyn TextNormalizer> = match config.text_normalizer {
            TextNormalizerKind::Bridge => Arc::new(BridgeTextNormalizer::new(bridge.clone())),
            TextNormalizerKind::Native => Arc::new(CharNormalizer),
        };

        let loader = AudioLoader::new(config.default_reference.clone())
            .with_fallback(Arc::new(BridgeReferenceAsset::new(bridge)));

        Self::new(
            loader,
            text_normalizer,
            registry,
            config.vocoder.clone(),
        )
    }

    /// Generate speech and write it to the request's output path
    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationReport> {
        let audio = self.generate_waveform(request)?;
        self.write_output(&request.output_path, &audio.samples)?;

        info!(
            "Generated {:.2} seconds of audio in {:.2?}.",
            audio.duration_seconds(),
            audio.elapsed
        );

        Ok(GenerationReport {
            id: audio.id,
            frame_budget: audio.plan.frame_budget.frames(),
            estimated_duration_seconds: audio.plan.duration_seconds,
            reference_duration_seconds: audio.reference_duration_seconds,
            generated_samples: audio.samples.len(),
            generated_duration_seconds: audio.duration_seconds(),
            elapsed: audio.elapsed,
            output_path: request.output_path.clone(),
        })
    }

    /// Everything up to, but not including, writing the output
    pub fn generate_waveform(&self, request: &GenerationRequest) -> Result<GeneratedAudio> {
        let id = Uuid::new_v4();
        let span = info_span!("generate", %id, model = %request.model_name);
        let _enter = span.enter();

        request.validate()?;

        let mut clip = self.loader.load(request.reference.as_ref())?;
        clip.normalize_level(&self.level)?;

        let plan = self.estimator.plan(
            &clip,
            &request.generation_text,
            request.duration_seconds,
            request.speed,
        )?;

        let text = self
            .text_normalizer
            .normalize(&prompt_text(clip.transcript(), &request.generation_text))?;
        debug!("Prompt normalized to {} tokens", text.len());

        let start = Instant::now();
        let sampler = self.registry.sampler(&request.model_name)?;
        let vocoder = self.registry.vocoder(&self.vocoder_name)?;

        info!("Generating {} total frames of audio...", plan.frame_budget);

        let reference_batch = [clip.samples()];
        let wave = sampler.sample(
            &SampleRequest {
                reference_batch: &reference_batch,
                text: &text,
                duration: plan.frame_budget,
                steps: request.steps,
                cfg_strength: request.cfg_strength,
                sway_sampling_coef: request.sway_sampling_coef,
                seed: request.seed,
            },
            vocoder.as_ref(),
        )?;

        let samples = trim_reference(wave, clip.len())?;

        Ok(GeneratedAudio {
            id,
            samples,
            plan,
            reference_duration_seconds: clip.duration_seconds(),
            elapsed: start.elapsed(),
        })
    }

    fn write_output(&self, path: &Path, samples: &[f32]) -> Result<()> {
        self.encoder.write_wav(path, samples)
    }
}

/// Drop the leading samples that reproduce the reference clip
fn trim_reference(mut wave: Vec<f32>, reference_len: usize) -> Result<Vec<f32>> {
    if wave.len() < reference_len {
        return Err(Error::InferenceError(format!(
            "sampler returned {} samples, fewer than the {}-sample reference",
            wave.len(),
            reference_len
        )));
    }
    wave.drain(..reference_len);
    Ok(wave)
}
