use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::provider::{ParagraphConstraints, ParagraphProvider, normalize_paragraph};
use crate::session::error::ProviderError;
use crate::session::selection::Topic;

const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Generates a fresh interview-style paragraph per request.
pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.gemini_api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey(config.gemini_api_key_env.clone()))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: ENDPOINT.to_string(),
            model: config.gemini_model.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        )
    }
}

pub fn build_prompt(topic: Topic, constraints: &ParagraphConstraints) -> String {
    let words = constraints.approx_word_count;
    let low = words.saturating_sub(10).max(1);
    let high = words + 10;
    format!(
        "Generate a short, factual, and interview-relevant paragraph (about {low}-{high} words) \
         based on the DSA topic: \"{}\". The paragraph should simulate a common technical \
         interview question or concept explanation, similar to what is typically asked in \
         coding interviews. For example, describe a classic problem (like \"Merge Intervals\", \
         \"Binary Search\", \"Heap Sort\") or a conceptual scenario that could be framed as an \
         MCQ. Ensure it is precise, logical, and clear enough for a typing test. Avoid fluff. \
         Reply with plain text only, no markdown.",
        topic.prompt_phrase()
    )
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Pulls `candidates[0].content.parts[0].text` out of a success body.
pub fn parse_response(body: &str) -> Result<String, ProviderError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|_| ProviderError::EmptyResponse)?;
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(ProviderError::EmptyResponse)?;
    normalize_paragraph(&text)
}

/// Maps a non-2xx response to the API's own message when it sent one.
pub fn parse_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody { message: Some(msg) },
        }) if !msg.is_empty() => ProviderError::Api(msg),
        _ => ProviderError::Status(status),
    }
}

impl ParagraphProvider for GeminiProvider {
    fn request(
        &self,
        topic: Topic,
        constraints: &ParagraphConstraints,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(topic, constraints) }] }]
        });
        log::info!("requesting {} paragraph from {}", topic.key(), self.model);

        let response = self
            .client
            .post(self.url())
            .json(&body)
            .send()
            .map_err(|e| ProviderError::Network(e.without_url().to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ProviderError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &text));
        }
        parse_response(&text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_mentions_topic_and_length() {
        let prompt = build_prompt(
            Topic::BinarySearch,
            &ParagraphConstraints {
                approx_word_count: 70,
            },
        );
        assert!(prompt.contains("\"binary search\""));
        assert!(prompt.contains("about 60-80 words"));
    }

    #[test]
    fn parses_first_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Arrays store\nelements contiguously."}]}}]}"#;
        assert_eq!(
            parse_response(body).unwrap(),
            "Arrays store elements contiguously."
        );
    }

    #[test]
    fn missing_candidates_is_empty_response() {
        assert_eq!(parse_response(r#"{"candidates":[]}"#), Err(ProviderError::EmptyResponse));
        assert_eq!(parse_response("{}"), Err(ProviderError::EmptyResponse));
        assert_eq!(
            parse_response(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#),
            Err(ProviderError::EmptyResponse)
        );
        assert_eq!(parse_response("not json"), Err(ProviderError::EmptyResponse));
    }

    #[test]
    fn error_body_message_is_surfaced() {
        let body = r#"{"error":{"code":400,"message":"API key not valid."}}"#;
        assert_eq!(
            parse_error(400, body),
            ProviderError::Api("API key not valid.".to_string())
        );
        assert_eq!(parse_error(502, "<html>"), ProviderError::Status(502));
    }

    #[test]
    fn missing_key_is_reported_by_env_name() {
        let mut config = Config::default();
        config.gemini_api_key_env = "TYPEDSA_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        let err = GeminiProvider::from_config(&config).err().unwrap();
        assert_eq!(
            err,
            ProviderError::MissingApiKey("TYPEDSA_TEST_KEY_THAT_IS_NEVER_SET".to_string())
        );
    }
}
