//! Capabilities consumed by the generation pipeline.
//!
//! The diffusion sampler and the vocoder are external models; the pipeline
//! only sees these single-method traits. [`python_bridge`] provides the
//! implementations backed by the Python worker.

mod python_bridge;

pub use python_bridge::{
    BridgeProcess, BridgeReferenceAsset, BridgeRequest, BridgeResponse, BridgeSampler,
    BridgeTextNormalizer, BridgeVocoder,
};

use crate::duration::FrameBudget;
use crate::error::{Error, Result};

/// Mel spectrogram handed from the sampler to the vocoder, row-major `[frames, channels]`
#[derive(Debug, Clone, PartialEq)]
pub struct MelSpectrogram {
    data: Vec<f32>,
    frames: usize,
    channels: usize,
}

impl MelSpectrogram {
    pub fn new(data: Vec<f32>, frames: usize, channels: usize) -> Result<Self> {
        if data.len() != frames * channels {
            return Err(Error::InferenceError(format!(
                "mel data has {} values, expected {} frames x {} channels",
                data.len(),
                frames,
                channels
            )));
        }
        Ok(Self {
            data,
            frames,
            channels,
        })
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

/// Everything the sampler needs for one generation
#[derive(Debug, Clone, Copy)]
pub struct SampleRequest<'a> {
    /// Reference waveforms; the pipeline always sends exactly one
    pub reference_batch: &'a [&'a [f32]],
    pub text: &'a [String],
    pub duration: FrameBudget,
    pub steps: usize,
    pub cfg_strength: f64,
    pub sway_sampling_coef: f64,
    pub seed: Option<u64>,
}

/// Turns mel spectrograms into waveforms
pub trait Vocoder: Send + Sync {
    fn decode(&self, mel: &MelSpectrogram) -> Result<Vec<f32>>;
}

/// Runs the diffusion sampler and decodes its output with `vocoder`.
///
/// The returned waveform spans the reference and the generated speech, with
/// the reference region first. Given the same `seed` the output must be
/// reproducible.
pub trait SpeechSampler: Send + Sync {
    fn sample(&self, request: &SampleRequest<'_>, vocoder: &dyn Vocoder) -> Result<Vec<f32>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_shape_is_checked() {
        assert!(MelSpectrogram::new(vec![0.0; 200], 2, 100).is_ok());
        assert!(MelSpectrogram::new(vec![0.0; 199], 2, 100).is_err());
    }
}
