use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::provider::ParagraphConstraints;
use crate::session::selection::{PracticeSelection, TimeBudget, Topic};

const PARAGRAPH_SOURCES: &[&str] = &["bundled", "gemini"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_topic")]
    pub default_topic: String,
    #[serde(default = "default_time_budget")]
    pub default_time_budget: String,
    /// Identity of the signed-in user. Sessions without one are not saved.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_paragraph_source")]
    pub paragraph_source: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_gemini_api_key_env")]
    pub gemini_api_key_env: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_approx_word_count")]
    pub approx_word_count: usize,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_topic() -> String {
    Topic::Arrays.key().to_string()
}
fn default_time_budget() -> String {
    TimeBudget::Seconds60.label().to_string()
}
fn default_paragraph_source() -> String {
    "bundled".to_string()
}
fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_gemini_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_approx_word_count() -> usize {
    70
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("typedsa")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_topic: default_topic(),
            default_time_budget: default_time_budget(),
            user_id: None,
            paragraph_source: default_paragraph_source(),
            gemini_model: default_gemini_model(),
            gemini_api_key_env: default_gemini_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
            approx_word_count: default_approx_word_count(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("typedsa")
            .join("config.toml")
    }

    /// Clamp numeric settings and reset unknown names to their defaults.
    pub fn validate(&mut self) {
        if self.default_topic.parse::<Topic>().is_err() {
            log::warn!("unknown topic {:?} in config, using default", self.default_topic);
            self.default_topic = default_topic();
        }
        if self.default_time_budget.parse::<TimeBudget>().is_err() {
            log::warn!(
                "unknown time limit {:?} in config, using default",
                self.default_time_budget
            );
            self.default_time_budget = default_time_budget();
        }
        if !PARAGRAPH_SOURCES.contains(&self.paragraph_source.as_str()) {
            self.paragraph_source = default_paragraph_source();
        }
        if self.user_id.as_deref().is_some_and(|u| u.trim().is_empty()) {
            self.user_id = None;
        }
        self.approx_word_count = self.approx_word_count.clamp(20, 200);
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 120);
    }

    pub fn default_selection(&self) -> PracticeSelection {
        PracticeSelection {
            topic: self.default_topic.parse().ok(),
            time_budget: self.default_time_budget.parse().ok(),
        }
    }

    pub fn paragraph_constraints(&self) -> ParagraphConstraints {
        ParagraphConstraints {
            approx_word_count: self.approx_word_count,
        }
    }

    pub fn data_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }
}
