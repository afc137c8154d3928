pub mod bundled;
#[cfg(feature = "network")]
pub mod gemini;

use std::sync::Arc;

use crate::config::Config;
use crate::session::error::ProviderError;
use crate::session::selection::Topic;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParagraphConstraints {
    pub approx_word_count: usize,
}

impl Default for ParagraphConstraints {
    fn default() -> Self {
        Self {
            approx_word_count: 70,
        }
    }
}

/// Supplies the text for one practice attempt.
pub trait ParagraphProvider: Send + Sync {
    fn request(
        &self,
        topic: Topic,
        constraints: &ParagraphConstraints,
    ) -> Result<String, ProviderError>;

    fn name(&self) -> &'static str;
}

/// Makes generated text typeable: strips markdown emphasis, folds every run of
/// whitespace (newlines included) into one space, trims the ends.
pub fn normalize_paragraph(raw: &str) -> Result<String, ProviderError> {
    let cleaned: String = raw.chars().filter(|&c| c != '*' && c != '`').collect();
    let text = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(text)
}

/// Picks the provider named in the config. Falls back to the bundled
/// paragraphs when a network provider cannot be built.
pub fn from_config(config: &Config) -> Arc<dyn ParagraphProvider> {
    match config.paragraph_source.as_str() {
        #[cfg(feature = "network")]
        "gemini" => match gemini::GeminiProvider::from_config(config) {
            Ok(provider) => return Arc::new(provider),
            Err(e) => log::warn!("gemini provider unavailable, using bundled paragraphs: {e}"),
        },
        #[cfg(not(feature = "network"))]
        "gemini" => log::warn!("built without the network feature, using bundled paragraphs"),
        _ => {}
    }
    Arc::new(bundled::BundledProvider::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        let text = normalize_paragraph("  A heap is\n\na tree.\t It   works. \n").unwrap();
        assert_eq!(text, "A heap is a tree. It works.");
    }

    #[test]
    fn normalize_strips_markdown_emphasis() {
        let text = normalize_paragraph("**Binary search** runs in `O(log n)` time.").unwrap();
        assert_eq!(text, "Binary search runs in O(log n) time.");
    }

    #[test]
    fn normalize_rejects_blank_text() {
        assert_eq!(normalize_paragraph(" \n\t "), Err(ProviderError::EmptyResponse));
        assert_eq!(normalize_paragraph("***"), Err(ProviderError::EmptyResponse));
    }

    #[test]
    fn unknown_source_uses_bundled() {
        let mut config = Config::default();
        config.paragraph_source = "carrier-pigeon".to_string();
        assert_eq!(from_config(&config).name(), "bundled");
    }

    #[test]
    fn unusable_gemini_source_falls_back_to_bundled() {
        // With or without the network feature, a missing key means bundled text.
        let mut config = Config::default();
        config.paragraph_source = "gemini".to_string();
        config.gemini_api_key_env = "TYPEDSA_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert_eq!(from_config(&config).name(), "bundled");
    }
}
