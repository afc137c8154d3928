use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rust_embed::Embed;

use crate::provider::{ParagraphConstraints, ParagraphProvider, normalize_paragraph};
use crate::session::error::ProviderError;
use crate::session::selection::Topic;

#[derive(Embed)]
#[folder = "assets/paragraphs/"]
struct ParagraphAssets;

/// Offline paragraphs compiled into the binary, one file per topic.
pub struct BundledProvider {
    rng: Mutex<SmallRng>,
}

impl BundledProvider {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    pub fn with_rng(rng: SmallRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    /// Blank-line separated paragraphs for a topic.
    pub fn paragraphs(topic: Topic) -> Vec<String> {
        let filename = format!("{}.txt", topic.key());
        let Some(file) = ParagraphAssets::get(&filename) else {
            return Vec::new();
        };
        let Ok(content) = std::str::from_utf8(file.data.as_ref()) else {
            return Vec::new();
        };
        extract_paragraphs(content)
    }
}

impl Default for BundledProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_paragraphs(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .filter_map(|block| normalize_paragraph(block).ok())
        .collect()
}

impl ParagraphProvider for BundledProvider {
    fn request(
        &self,
        topic: Topic,
        constraints: &ParagraphConstraints,
    ) -> Result<String, ProviderError> {
        let paragraphs = Self::paragraphs(topic);
        if paragraphs.is_empty() {
            return Err(ProviderError::NoBundledText(topic.key().to_string()));
        }

        // Prefer paragraphs near the requested length; fall back to any.
        let target = constraints.approx_word_count;
        let close: Vec<&String> = paragraphs
            .iter()
            .filter(|p| p.split(' ').count().abs_diff(target) <= target / 2)
            .collect();
        let pool: Vec<&String> = if close.is_empty() {
            paragraphs.iter().collect()
        } else {
            close
        };

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let idx = rng.gen_range(0..pool.len());
        Ok(pool[idx].clone())
    }

    fn name(&self) -> &'static str {
        "bundled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::selection::ALL_TOPICS;

    #[test]
    fn every_topic_has_bundled_text() {
        for &topic in ALL_TOPICS {
            let paragraphs = BundledProvider::paragraphs(topic);
            assert!(!paragraphs.is_empty(), "no paragraphs for {}", topic.key());
            for p in paragraphs {
                assert!(!p.contains('\n'));
                assert!(!p.contains("  "));
            }
        }
    }

    #[test]
    fn request_returns_a_paragraph_for_topic() {
        let provider = BundledProvider::with_rng(SmallRng::seed_from_u64(7));
        let text = provider
            .request(Topic::Graphs, &ParagraphConstraints::default())
            .unwrap();
        assert!(BundledProvider::paragraphs(Topic::Graphs).contains(&text));
    }

    #[test]
    fn extract_splits_on_blank_lines() {
        let paragraphs = extract_paragraphs("first line\nwraps here\n\nsecond\n\n\n");
        assert_eq!(paragraphs, vec!["first line wraps here", "second"]);
    }
}
