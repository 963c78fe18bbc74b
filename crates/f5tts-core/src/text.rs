//! Text normalization into model input tokens

use crate::error::Result;

/// Converts mixed-script text into the token sequence the model consumes
pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> Result<Vec<String>>;
}

/// One token per character.
///
/// Matches the pinyin conversion for Latin-script text. CJK characters pass
/// through unconverted, so Chinese prompts should use the bridge normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharNormalizer;

impl TextNormalizer for CharNormalizer {
    fn normalize(&self, text: &str) -> Result<Vec<String>> {
        Ok(text.chars().map(String::from).collect())
    }
}

/// Join reference transcript and new text the way the model was trained
pub fn prompt_text(reference_text: &str, generation_text: &str) -> String {
    format!("{} {}", reference_text, generation_text)
}
