//! Loudness normalization of reference audio

use tracing::debug;

use crate::config::TARGET_RMS;
use crate::error::{Error, Result};

/// Raises quiet audio to a target RMS; louder audio is left untouched
#[derive(Debug, Clone, Copy)]
pub struct LevelNormalizer {
    target_rms: f32,
}

impl LevelNormalizer {
    pub fn new(target_rms: f32) -> Self {
        Self { target_rms }
    }

    pub fn target_rms(&self) -> f32 {
        self.target_rms
    }

    /// Root-mean-square amplitude, accumulated in f64
    pub fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_sq / samples.len() as f64).sqrt() as f32
    }

    /// Scale `samples` in place and return the gain that was applied.
    ///
    /// Silent or empty input has no defined gain and is rejected with
    /// [`Error::DegenerateInput`].
    pub fn normalize(&self, samples: &mut [f32]) -> Result<f32> {
        let rms = Self::rms(samples);
        if rms == 0.0 {
            return Err(Error::DegenerateInput(
                "reference audio is silent (RMS is zero)".to_string(),
            ));
        }

        if rms >= self.target_rms {
            return Ok(1.0);
        }

        let gain = self.target_rms / rms;
        debug!("Reference RMS {:.4} below target, applying gain {:.3}", rms, gain);
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
        Ok(gain)
    }
}

impl Default for LevelNormalizer {
    fn default() -> Self {
        Self::new(TARGET_RMS)
    }
}
