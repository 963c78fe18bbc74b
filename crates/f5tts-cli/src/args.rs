//! Command-line arguments

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use f5tts_core::{EngineConfig, GenerationRequest, ReferenceAudio, TextNormalizerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NormalizerArg {
    /// Pinyin conversion in the Python worker
    Bridge,
    /// Per-character tokens, no Python needed
    Native,
}

impl From<NormalizerArg> for TextNormalizerKind {
    fn from(arg: NormalizerArg) -> Self {
        match arg {
            NormalizerArg::Bridge => TextNormalizerKind::Bridge,
            NormalizerArg::Native => TextNormalizerKind::Native,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "f5tts", version, about = "Generate audio from text using F5-TTS")]
pub struct Cli {
    /// Name of the model to use
    #[arg(long)]
    pub model: Option<String>,

    /// Text to generate speech from
    #[arg(long, required_unless_present = "check")]
    pub text: Option<String>,

    /// Duration of the generated audio in seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Path to the reference audio file
    #[arg(long, requires = "ref_text")]
    pub ref_audio: Option<PathBuf>,

    /// Text spoken in the reference audio
    #[arg(long)]
    pub ref_text: Option<String>,

    /// Path to save the generated audio output
    #[arg(long, default_value = "output.wav")]
    pub output: PathBuf,

    /// Strength of classifier-free guidance
    #[arg(long, default_value_t = 2.0, allow_negative_numbers = true)]
    pub cfg: f64,

    /// Coefficient for sway sampling
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    pub sway_coef: f64,

    /// Speed factor for the duration heuristic
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Seed for noise generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Step count for ODE sampling
    #[arg(long, default_value_t = 32)]
    pub step: usize,

    /// Settings file (TOML); `f5tts.toml` is read when present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the configured text normalizer
    #[arg(long, value_enum)]
    pub text_normalizer: Option<NormalizerArg>,

    /// Check that the Python worker and its packages are usable, then exit
    #[arg(long)]
    pub check: bool,
}

impl Cli {
    /// Build the generation request, falling back to `config` for the model
    pub fn to_request(&self, config: &EngineConfig) -> GenerationRequest {
        let mut request = GenerationRequest::new(self.text.clone().unwrap_or_default())
            .with_model(
                self.model
                    .clone()
                    .unwrap_or_else(|| config.default_model.clone()),
            )
            .with_cfg_strength(self.cfg)
            .with_sway_sampling_coef(self.sway_coef)
            .with_steps(self.step)
            .with_speed(self.speed)
            .with_output_path(self.output.clone());

        if let Some(duration) = self.duration {
            request = request.with_duration(duration);
        }
        if let Some(seed) = self.seed {
            request = request.with_seed(seed);
        }
        if let (Some(path), Some(transcript)) = (&self.ref_audio, &self.ref_text) {
            request = request.with_reference(ReferenceAudio::new(path, transcript.clone()));
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["f5tts", "--text", "hello"]).unwrap();
        let request = cli.to_request(&EngineConfig::default());

        assert_eq!(request.generation_text, "hello");
        assert_eq!(request.model_name, "f5-tts");
        assert_eq!(request.cfg_strength, 2.0);
        assert_eq!(request.sway_sampling_coef, -1.0);
        assert_eq!(request.steps, 32);
        assert_eq!(request.speed, 1.0);
        assert_eq!(request.seed, None);
        assert_eq!(request.duration_seconds, None);
        assert_eq!(request.output_path, PathBuf::from("output.wav"));
        assert!(request.reference.is_none());
    }

    #[test]
    fn test_full_arguments() {
        let cli = Cli::try_parse_from([
            "f5tts",
            "--text",
            "hi there",
            "--model",
            "someone/f5-custom",
            "--ref-audio",
            "ref.wav",
            "--ref-text",
            "hello world",
            "--duration",
            "2.5",
            "--sway-coef",
            "-0.5",
            "--seed",
            "7",
            "--step",
            "16",
            "--output",
            "out.wav",
            "--text-normalizer",
            "native",
        ])
        .unwrap();
        let request = cli.to_request(&EngineConfig::default());

        assert_eq!(request.model_name, "someone/f5-custom");
        assert_eq!(
            request.reference,
            Some(ReferenceAudio::new("ref.wav", "hello world"))
        );
        assert_eq!(request.duration_seconds, Some(2.5));
        assert_eq!(request.sway_sampling_coef, -0.5);
        assert_eq!(request.seed, Some(7));
        assert_eq!(request.steps, 16);
        assert_eq!(cli.text_normalizer, Some(NormalizerArg::Native));
    }

    #[test]
    fn test_ref_audio_needs_transcript() {
        let result = Cli::try_parse_from(["f5tts", "--text", "hi", "--ref-audio", "ref.wav"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_text_is_required() {
        assert!(Cli::try_parse_from(["f5tts"]).is_err());
    }

    #[test]
    fn test_check_needs_no_text() {
        let cli = Cli::try_parse_from(["f5tts", "--check"]).unwrap();
        assert!(cli.check);
        assert!(cli.text.is_none());
    }

    #[test]
    fn test_model_falls_back_to_config() {
        let cli = Cli::try_parse_from(["f5tts", "--text", "hi"]).unwrap();
        let config = EngineConfig {
            default_model: "local/f5".to_string(),
            ..EngineConfig::default()
        };
        assert_eq!(cli.to_request(&config).model_name, "local/f5");
    }
}
