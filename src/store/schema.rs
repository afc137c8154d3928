use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::machine::FinishReason;
use crate::session::selection::{TimeBudget, Topic};

const SCHEMA_VERSION: u32 = 1;

/// One finished practice session as written to the results sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedResult {
    pub user_id: String,
    pub wpm: u32,
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub topic: Option<Topic>,
    #[serde(default)]
    pub time_budget: Option<TimeBudget>,
    #[serde(default)]
    pub elapsed_secs: u32,
    #[serde(default)]
    pub typed_chars: usize,
    #[serde(default)]
    pub target_chars: usize,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultHistoryData {
    pub schema_version: u32,
    pub sessions: Vec<PersistedResult>,
}

impl Default for ResultHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            sessions: Vec::new(),
        }
    }
}

impl ResultHistoryData {
    pub fn for_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a PersistedResult> {
        self.sessions.iter().filter(move |r| r.user_id == user_id)
    }
}

/// Aggregates shown by `--history`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub best_wpm: u32,
    pub mean_wpm: f64,
    pub mean_accuracy: f64,
}

impl HistorySummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a PersistedResult>) -> Self {
        let mut summary = HistorySummary::default();
        let mut wpm_sum = 0.0;
        let mut acc_sum = 0.0;
        for r in results {
            summary.sessions += 1;
            summary.best_wpm = summary.best_wpm.max(r.wpm);
            wpm_sum += r.wpm as f64;
            acc_sum += r.accuracy;
        }
        if summary.sessions > 0 {
            summary.mean_wpm = wpm_sum / summary.sessions as f64;
            summary.mean_accuracy = acc_sum / summary.sessions as f64;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(user: &str, wpm: u32, accuracy: f64) -> PersistedResult {
        PersistedResult {
            user_id: user.to_string(),
            wpm,
            accuracy,
            timestamp: Utc::now(),
            topic: Some(Topic::Arrays),
            time_budget: Some(TimeBudget::Seconds30),
            elapsed_secs: 30,
            typed_chars: 100,
            target_chars: 100,
            finish_reason: Some(FinishReason::TimeExhausted),
        }
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        assert_eq!(HistorySummary::from_results([]), HistorySummary::default());
    }

    #[test]
    fn summary_filters_by_user() {
        let data = ResultHistoryData {
            schema_version: SCHEMA_VERSION,
            sessions: vec![
                result("u1", 40, 90.0),
                result("u2", 99, 50.0),
                result("u1", 60, 100.0),
            ],
        };
        let summary = HistorySummary::from_results(data.for_user("u1"));
        assert_eq!(summary.sessions, 2);
        assert_eq!(summary.best_wpm, 60);
        assert!((summary.mean_wpm - 50.0).abs() < f64::EPSILON);
        assert!((summary.mean_accuracy - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn minimal_record_deserializes() {
        let json = r#"{"user_id":"abc","wpm":42,"accuracy":97.5,"timestamp":"2025-01-01T00:00:00Z"}"#;
        let r: PersistedResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.wpm, 42);
        assert_eq!(r.topic, None);
        assert_eq!(r.finish_reason, None);
    }
}
