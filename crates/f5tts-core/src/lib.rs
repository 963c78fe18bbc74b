//! F5-TTS Core - Zero-shot speech generation pipeline
//!
//! This crate drives an F5-TTS diffusion model from Rust: it prepares the
//! reference clip, estimates how many mel frames the new speech needs, runs
//! the sampler and vocoder, and writes the result.
//!
//! # Architecture
//!
//! - [`audio`]: reference loading, loudness normalization, WAV output
//! - [`duration`]: frame budget heuristic
//! - [`inference`]: sampler/vocoder capabilities and the Python bridge
//! - [`model`]: checkpoint resolution and the model registry
//! - [`pipeline`]: the orchestrator tying it all together
//!
//! # Example
//!
//! ```ignore
//! use f5tts_core::{EngineConfig, GenerationOrchestrator, GenerationRequest, ReferenceAudio};
//!
//! let orchestrator = GenerationOrchestrator::from_config(&EngineConfig::default());
//! let request = GenerationRequest::new("The quick brown fox.")
//!     .with_reference(ReferenceAudio::new("ref.wav", "Text spoken in ref.wav"))
//!     .with_seed(42);
//! let report = orchestrator.generate(&request)?;
//! ```

pub mod audio;
pub mod config;
pub mod duration;
pub mod error;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod text;

pub use audio::{AudioLoader, LevelNormalizer, ReferenceAudio, ReferenceClip};
pub use config::{EngineConfig, TextNormalizerKind};
pub use duration::{DurationEstimator, DurationPlan, FrameBudget};
pub use error::{Error, Result};
pub use inference::{MelSpectrogram, SampleRequest, SpeechSampler, Vocoder};
pub use model::{ModelLoader, ModelRegistry};
pub use pipeline::{GeneratedAudio, GenerationOrchestrator, GenerationReport, GenerationRequest};
pub use text::{CharNormalizer, TextNormalizer};
