//! Output duration heuristic.
//!
//! The model generates a fixed number of mel frames covering both the
//! reference clip and the new speech. When the caller gives no duration we
//! assume the new text is spoken at the same rate, in bytes per frame, as the
//! reference transcript. Full-width CJK pause punctuation counts as three
//! extra bytes to leave room for the pause.

use tracing::info;

use crate::audio::ReferenceClip;
use crate::config::{HOP_LENGTH, SAMPLE_RATE};
use crate::error::{Error, Result};

/// Punctuation that is weighted as a pause
pub const PAUSE_PUNCTUATION: [char; 7] = ['。', '，', '、', '；', '：', '？', '！'];

const PAUSE_WEIGHT: usize = 3;

/// Text length in UTF-8 bytes, plus the pause weight for each pause mark
pub fn text_length(text: &str) -> usize {
    let pauses = text
        .chars()
        .filter(|c| PAUSE_PUNCTUATION.contains(c))
        .count();
    text.len() + PAUSE_WEIGHT * pauses
}

/// Total frames (reference plus generated) the sampler must produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameBudget(usize);

impl FrameBudget {
    pub fn frames(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for FrameBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Intermediate values of the heuristic, kept for logging and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationEstimate {
    pub reference_frames: usize,
    pub generated_frames: usize,
    /// Seconds of new speech, excluding the reference
    pub duration_seconds: f64,
}

/// Duration chosen for a request and the frame budget derived from it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationPlan {
    pub duration_seconds: f64,
    pub frame_budget: FrameBudget,
    /// Present when the duration came from the heuristic
    pub estimate: Option<DurationEstimate>,
}

#[derive(Debug, Clone, Copy)]
pub struct DurationEstimator {
    sample_rate: u32,
    hop_length: usize,
}

impl DurationEstimator {
    pub fn new(sample_rate: u32, hop_length: usize) -> Self {
        Self {
            sample_rate,
            hop_length,
        }
    }

    pub fn frames_per_second(&self) -> f64 {
        self.sample_rate as f64 / self.hop_length as f64
    }

    /// Estimate how long `generation_text` takes to say in the reference voice
    pub fn estimate(
        &self,
        reference_samples: usize,
        reference_duration_seconds: f64,
        reference_text: &str,
        generation_text: &str,
        speed: f64,
    ) -> Result<DurationEstimate> {
        validate_speed(speed)?;

        let ref_text_len = text_length(reference_text);
        if ref_text_len == 0 {
            return Err(Error::InvalidInput(
                "reference transcript is empty".to_string(),
            ));
        }
        let gen_text_len = text_length(generation_text);

        let reference_frames = reference_samples / self.hop_length;
        let generated_frames = (reference_frames as f64
            * (gen_text_len as f64 / ref_text_len as f64)
            / speed) as usize;

        let duration_seconds = (reference_frames + generated_frames) as f64
            / self.frames_per_second()
            - reference_duration_seconds;

        Ok(DurationEstimate {
            reference_frames,
            generated_frames,
            duration_seconds,
        })
    }

    /// Frames covering the reference plus `duration_seconds` of new speech
    pub fn frame_budget(&self, reference_duration_seconds: f64, duration_seconds: f64) -> FrameBudget {
        let frames = ((reference_duration_seconds + duration_seconds) * self.frames_per_second())
            .round()
            .max(0.0);
        FrameBudget(frames as usize)
    }

    /// Pick the duration for a request: the caller's, or the heuristic's
    pub fn plan(
        &self,
        clip: &ReferenceClip,
        generation_text: &str,
        duration_seconds: Option<f64>,
        speed: f64,
    ) -> Result<DurationPlan> {
        let (duration_seconds, estimate) = match duration_seconds {
            Some(duration) => {
                if !duration.is_finite() || duration <= 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "duration must be a positive number of seconds, got {}",
                        duration
                    )));
                }
                (duration, None)
            }
            None => {
                let estimate = self.estimate(
                    clip.len(),
                    clip.duration_seconds(),
                    clip.transcript(),
                    generation_text,
                    speed,
                )?;
                info!(
                    "Using duration of {:.2} seconds for generated speech.",
                    estimate.duration_seconds
                );
                (estimate.duration_seconds, Some(estimate))
            }
        };

        let frame_budget = self.frame_budget(clip.duration_seconds(), duration_seconds);
        Ok(DurationPlan {
            duration_seconds,
            frame_budget,
            estimate,
        })
    }
}

impl Default for DurationEstimator {
    fn default() -> Self {
        Self::new(SAMPLE_RATE, HOP_LENGTH)
    }
}

fn validate_speed(speed: f64) -> Result<()> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "speed must be positive, got {}",
            speed
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(samples: usize, transcript: &str) -> ReferenceClip {
        ReferenceClip::new(vec![0.1; samples], SAMPLE_RATE, transcript)
    }

    #[test]
    fn test_text_length_weights_pauses() {
        assert_eq!(text_length("hello world"), 11);
        assert_eq!(text_length(""), 0);
        // each CJK char is 3 bytes; the two pause marks add 3 each
        assert_eq!(text_length("你好，世界。"), 18 + 6);
        // ASCII punctuation is not a pause mark
        assert_eq!(text_length("a, b."), 5);
    }

    #[test]
    fn test_three_second_reference() {
        let estimator = DurationEstimator::default();
        let estimate = estimator
            .estimate(72000, 3.0, "hello world", "hi there", 1.0)
            .unwrap();

        assert_eq!(estimate.reference_frames, 281);
        assert_eq!(estimate.generated_frames, 204);
        let expected = 485.0 / 93.75 - 3.0;
        assert!((estimate.duration_seconds - expected).abs() < 1e-9);

        let budget = estimator.frame_budget(3.0, estimate.duration_seconds);
        assert_eq!(budget.frames(), 485);
    }

    #[test]
    fn test_equal_texts_generate_reference_frames() {
        let estimate = DurationEstimator::default()
            .estimate(207 * 256, 207.0 * 256.0 / 24000.0, "hello world", "hello world", 1.0)
            .unwrap();
        assert_eq!(estimate.reference_frames, 207);
        assert_eq!(estimate.generated_frames, 207);
    }

    #[test]
    fn test_plan_matches_estimate() {
        let plan = DurationEstimator::default()
            .plan(&clip(72000, "hello world"), "hi there", None, 1.0)
            .unwrap();
        assert_eq!(plan.frame_budget, FrameBudget(485));
        assert_eq!(plan.estimate.map(|e| e.generated_frames), Some(204));
    }

    #[test]
    fn test_explicit_duration_skips_heuristic() {
        let plan = DurationEstimator::default()
            .plan(&clip(72000, ""), "hi there", Some(2.0), 1.0)
            .unwrap();
        assert!(plan.estimate.is_none());
        assert_eq!(plan.duration_seconds, 2.0);
        assert_eq!(plan.frame_budget.frames(), (5.0f64 * 93.75).round() as usize);
    }

    #[test]
    fn test_bad_explicit_duration() {
        let estimator = DurationEstimator::default();
        let clip = clip(72000, "hello world");
        for duration in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = estimator.plan(&clip, "hi", Some(duration), 1.0).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
    }

    #[test]
    fn test_empty_reference_transcript() {
        let err = DurationEstimator::default()
            .estimate(72000, 3.0, "", "hi there", 1.0)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_non_positive_speed() {
        let estimator = DurationEstimator::default();
        for speed in [0.0, -1.0, f64::NAN] {
            let err = estimator
                .estimate(72000, 3.0, "hello world", "hi there", speed)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
    }

    #[test]
    fn test_faster_speech_is_never_longer() {
        let estimator = DurationEstimator::default();
        let mut previous = f64::INFINITY;
        for speed in [0.25, 0.5, 0.8, 1.0, 1.3, 2.0, 4.0] {
            let estimate = estimator
                .estimate(
                    96000,
                    4.0,
                    "Some call me nature, others call me mother nature.",
                    "这是一个测试，看看效果怎么样？",
                    speed,
                )
                .unwrap();
            assert!(estimate.duration_seconds <= previous);
            previous = estimate.duration_seconds;
        }
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let estimator = DurationEstimator::default();
        let clip = clip(50000, "the quick brown fox");
        let first = estimator.plan(&clip, "jumps over the lazy dog", None, 1.1).unwrap();
        for _ in 0..10 {
            assert_eq!(
                estimator.plan(&clip, "jumps over the lazy dog", None, 1.1).unwrap(),
                first
            );
        }
    }
}
